//! Single-image output container.
//!
//! The container holds exactly one stream and one packet. The header carries
//! the PNM magic and geometry, the packet carries the raster and the trailer
//! flushes the destination.

use std::io::Write;

use crate::image_pipeline::encode::codec::OutputCodec;
use crate::image_pipeline::encode::pnm_encoder::EncodedPacket;
use crate::image_pipeline::frame::PixelFormat;

pub const CONTAINER_NAME: &str = "image2";

/// Parameters of the output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParams {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub codec: OutputCodec,
    pub format: PixelFormat,
    /// Numerator and denominator; a still image uses 1/1.
    pub time_base: (u32, u32),
}

impl StreamParams {
    pub fn new(width: u32, height: u32, codec: OutputCodec) -> Self {
        Self {
            index: 0,
            width,
            height,
            codec,
            format: codec.pixel_format(),
            time_base: (1, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MuxState {
    Setup,
    HeaderWritten,
    PacketWritten,
    Finished,
}

pub struct ImageMuxer<W: Write> {
    out: W,
    stream: Option<StreamParams>,
    state: MuxState,
}

impl<W: Write> ImageMuxer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stream: None,
            state: MuxState::Setup,
        }
    }

    /// Adds the output stream and returns its index.
    pub fn add_stream(&mut self, mut params: StreamParams) -> Result<usize, String> {
        if self.stream.is_some() {
            return Err(format!("{CONTAINER_NAME} holds a single stream"));
        }
        params.index = 0;
        self.stream = Some(params);
        Ok(0)
    }

    pub fn stream(&self) -> Option<&StreamParams> {
        self.stream.as_ref()
    }

    pub fn write_header(&mut self) -> Result<(), String> {
        if self.state != MuxState::Setup {
            return Err("header already written".to_string());
        }
        let stream = self.stream.as_ref().ok_or("no output stream")?;
        let mut header = Vec::with_capacity(32);
        header.extend_from_slice(stream.codec.magic());
        header.extend_from_slice(format!("\n{} {}\n", stream.width, stream.height).as_bytes());
        if stream.codec != OutputCodec::Pbm {
            header.extend_from_slice(b"255\n");
        }
        self.out.write_all(&header).map_err(|e| e.to_string())?;
        self.state = MuxState::HeaderWritten;
        Ok(())
    }

    pub fn write_packet(&mut self, packet: &EncodedPacket) -> Result<(), String> {
        match self.state {
            MuxState::HeaderWritten => {}
            MuxState::Setup => return Err("header not written".to_string()),
            MuxState::PacketWritten | MuxState::Finished => {
                return Err(format!("{CONTAINER_NAME} holds a single packet"));
            }
        }
        let stream = self.stream.as_ref().ok_or("no output stream")?;
        if packet.stream_index != stream.index {
            return Err(format!("packet for unknown stream {}", packet.stream_index));
        }
        self.out.write_all(&packet.data).map_err(|e| e.to_string())?;
        self.state = MuxState::PacketWritten;
        Ok(())
    }

    /// Flushes the destination and hands it back.
    pub fn write_trailer(mut self) -> Result<W, String> {
        if self.state != MuxState::PacketWritten {
            return Err("no packet written".to_string());
        }
        self.out.flush().map_err(|e| e.to_string())?;
        self.state = MuxState::Finished;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layouts() {
        let cases = [
            (OutputCodec::Ppm, b"P6\n3 2\n255\n".to_vec()),
            (OutputCodec::Pgm, b"P5\n3 2\n255\n".to_vec()),
            (OutputCodec::Pbm, b"P4\n3 2\n".to_vec()),
        ];
        for (codec, expected) in cases {
            let mut muxer = ImageMuxer::new(Vec::new());
            muxer.add_stream(StreamParams::new(3, 2, codec)).unwrap();
            muxer.write_header().unwrap();
            muxer
                .write_packet(&EncodedPacket { stream_index: 0, data: vec![7] })
                .unwrap();
            let mut out = muxer.write_trailer().unwrap();
            assert_eq!(out.pop(), Some(7));
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn test_single_stream_single_packet() {
        let mut muxer = ImageMuxer::new(Vec::new());
        muxer.add_stream(StreamParams::new(1, 1, OutputCodec::Pgm)).unwrap();
        assert!(muxer.add_stream(StreamParams::new(1, 1, OutputCodec::Pgm)).is_err());
        assert_eq!(muxer.stream().map(|s| s.time_base), Some((1, 1)));

        let packet = EncodedPacket { stream_index: 0, data: vec![0] };
        assert!(muxer.write_packet(&packet).is_err());
        muxer.write_header().unwrap();
        muxer.write_packet(&packet).unwrap();
        assert!(muxer.write_packet(&packet).is_err());
    }

    #[test]
    fn test_trailer_requires_packet() {
        let mut muxer = ImageMuxer::new(Vec::new());
        muxer.add_stream(StreamParams::new(1, 1, OutputCodec::Pbm)).unwrap();
        muxer.write_header().unwrap();
        assert!(muxer.write_trailer().is_err());
    }
}
