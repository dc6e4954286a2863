//! Raster encoding for the PBM, PGM and PPM codecs.

use crate::image_pipeline::encode::codec::OutputCodec;
use crate::image_pipeline::encode::muxer::StreamParams;
use crate::image_pipeline::frame::Image;

/// One encoded frame: the packed raster rows, without any header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    pub stream_index: usize,
    pub data: Vec<u8>,
}

/// Encoder bound to a single output stream.
#[derive(Debug)]
pub struct PnmEncoder {
    params: StreamParams,
}

impl PnmEncoder {
    /// Opens an encoder for `params`; the stream format must be the one the codec encodes.
    pub fn open(params: &StreamParams) -> Result<Self, String> {
        if params.width == 0 || params.height == 0 {
            return Err(format!("invalid frame size {}x{}", params.width, params.height));
        }
        if params.format != params.codec.pixel_format() {
            return Err(format!(
                "{} does not support pixel format {}",
                params.codec, params.format
            ));
        }
        Ok(Self { params: params.clone() })
    }

    pub fn codec(&self) -> OutputCodec {
        self.params.codec
    }

    /// Encodes `image` into one packet of tightly packed rows.
    pub fn encode(&mut self, image: &Image) -> Result<EncodedPacket, String> {
        if image.format() != self.params.format {
            return Err(format!(
                "frame format {} does not match stream format {}",
                image.format(),
                self.params.format
            ));
        }
        if image.width() != self.params.width || image.height() != self.params.height {
            return Err(format!(
                "frame size {}x{} does not match stream size {}x{}",
                image.width(),
                image.height(),
                self.params.width,
                self.params.height
            ));
        }

        let row_bytes = self.params.format.min_stride(image.width());
        let mut data = Vec::with_capacity(row_bytes * image.height() as usize);
        for y in 0..image.height() {
            data.extend_from_slice(image.row(0, y));
        }
        if self.params.codec == OutputCodec::Pbm {
            clear_padding_bits(&mut data, image.width(), row_bytes);
        }

        Ok(EncodedPacket { stream_index: self.params.index, data })
    }
}

/// Zeroes the unused low bits of the last byte of every bi-level row.
fn clear_padding_bits(data: &mut [u8], width: u32, row_bytes: usize) {
    let used = (width % 8) as u8;
    if used == 0 || row_bytes == 0 {
        return;
    }
    let mask = 0xFFu8 << (8 - used);
    for row in data.chunks_exact_mut(row_bytes) {
        if let Some(last) = row.last_mut() {
            *last &= mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::frame::{Pixel, PixelFormat, Plane};

    fn params(codec: OutputCodec, width: u32, height: u32) -> StreamParams {
        StreamParams::new(width, height, codec)
    }

    #[test]
    fn test_open_rejects_mismatched_format() {
        let mut stream = params(OutputCodec::Pgm, 2, 2);
        stream.format = PixelFormat::Rgb24;
        let err = PnmEncoder::open(&stream).unwrap_err();
        assert!(err.contains("rgb24"));

        assert!(PnmEncoder::open(&params(OutputCodec::Ppm, 0, 2)).is_err());
    }

    #[test]
    fn test_encode_rejects_other_geometry() {
        let mut encoder = PnmEncoder::open(&params(OutputCodec::Pgm, 2, 2)).unwrap();
        let image = Image::new(3, 2, PixelFormat::Gray8).unwrap();
        assert!(encoder.encode(&image).is_err());

        let rgb = Image::new(2, 2, PixelFormat::Rgb24).unwrap();
        assert!(encoder.encode(&rgb).is_err());
    }

    #[test]
    fn test_stride_padding_is_not_written() {
        let image = Image::from_planes(
            2,
            2,
            PixelFormat::Gray8,
            vec![Plane::new(vec![1, 2, 0xEE, 0xEE, 3, 4, 0xEE, 0xEE], 4)],
        )
        .unwrap();
        let mut encoder = PnmEncoder::open(&params(OutputCodec::Pgm, 2, 2)).unwrap();
        let packet = encoder.encode(&image).unwrap();
        assert_eq!(packet.data, vec![1, 2, 3, 4]);
        assert_eq!(packet.stream_index, 0);
    }

    #[test]
    fn test_bilevel_padding_bits_are_zero() {
        // 3 pixels wide: only the top three bits of each row byte are used.
        let image = Image::from_planes(
            3,
            1,
            PixelFormat::MonoWhite,
            vec![Plane::new(vec![0b1011_1111], 1)],
        )
        .unwrap();
        assert_eq!(image.get_pixel(1, 0), Pixel::WHITE);

        let mut encoder = PnmEncoder::open(&params(OutputCodec::Pbm, 3, 1)).unwrap();
        let packet = encoder.encode(&image).unwrap();
        assert_eq!(packet.data, vec![0b1010_0000]);
    }
}
