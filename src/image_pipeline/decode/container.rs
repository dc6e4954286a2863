//! Container probing and single-image demuxing.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::image_pipeline::common::error::{ImageIoError, Result};
use crate::image_pipeline::decode::pnm_decoder;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Kind of data carried by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Audio,
    Data,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Data => "data",
        })
    }
}

/// Coding scheme of a stream's packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecId {
    Pnm,
    Png,
    Tiff,
    /// Recognised by the container but without a decoder.
    Unknown,
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodecId::Pnm => "pnm",
            CodecId::Png => "png",
            CodecId::Tiff => "tiff",
            CodecId::Unknown => "unknown",
        })
    }
}

/// Metadata of one stream inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: usize,
    pub media_type: MediaType,
    pub codec: CodecId,
    /// Frame size when the container header announces it
    pub dimensions: Option<(u32, u32)>,
}

/// Coded bytes of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub stream_index: usize,
    pub data: Vec<u8>,
}

/// Reads stream metadata and coded packets from a container.
pub trait Demuxer {
    /// Short name of the container format
    fn format_name(&self) -> &str;

    fn streams(&self) -> &[StreamInfo];

    /// Next packet in file order, `Ok(None)` once the container is exhausted.
    fn read_packet(&mut self) -> std::result::Result<Option<Packet>, String>;
}

/// Single-image file formats recognised by their magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Pnm,
    Png,
    Tiff,
}

impl ContainerKind {
    pub fn probe(data: &[u8]) -> Option<Self> {
        match data {
            [b'P', b'1'..=b'7', ..] => Some(ContainerKind::Pnm),
            _ if data.starts_with(PNG_SIGNATURE) => Some(ContainerKind::Png),
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(ContainerKind::Tiff),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Pnm => "pnm_pipe",
            ContainerKind::Png => "png_pipe",
            ContainerKind::Tiff => "tiff_pipe",
        }
    }

    fn codec(self) -> CodecId {
        match self {
            ContainerKind::Pnm => CodecId::Pnm,
            ContainerKind::Png => CodecId::Png,
            ContainerKind::Tiff => CodecId::Tiff,
        }
    }
}

/// Demuxer for files holding exactly one still image.
///
/// The whole file is the single packet of stream 0.
#[derive(Debug)]
pub struct ImageDemuxer {
    kind: ContainerKind,
    streams: Vec<StreamInfo>,
    data: Option<Vec<u8>>,
}

impl ImageDemuxer {
    pub fn open(path: &Path, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(ImageIoError::EmptySource { path: path.to_path_buf() });
        }

        let kind = ContainerKind::probe(&data).ok_or_else(|| ImageIoError::Open {
            path: path.to_path_buf(),
            reason: "unrecognized container format".to_string(),
        })?;

        let dimensions = peek_dimensions(kind, &data);
        debug!("Probed {} container, {} bytes, dimensions {:?}", kind.name(), data.len(), dimensions);

        Ok(Self {
            kind,
            streams: vec![StreamInfo {
                index: 0,
                media_type: MediaType::Image,
                codec: kind.codec(),
                dimensions,
            }],
            data: Some(data),
        })
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }
}

impl Demuxer for ImageDemuxer {
    fn format_name(&self) -> &str {
        self.kind.name()
    }

    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn read_packet(&mut self) -> std::result::Result<Option<Packet>, String> {
        Ok(self.data.take().map(|data| Packet { stream_index: 0, data }))
    }
}

fn peek_dimensions(kind: ContainerKind, data: &[u8]) -> Option<(u32, u32)> {
    match kind {
        ContainerKind::Pnm => pnm_decoder::parse_header(data)
            .ok()
            .map(|header| (header.width, header.height)),
        // IHDR is always the first chunk: length, type, width, height.
        ContainerKind::Png => {
            let ihdr = data.get(16..24)?;
            let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
            let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
            Some((width, height))
        }
        ContainerKind::Tiff => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_magic_bytes() {
        assert_eq!(ContainerKind::probe(b"P4\n1 1\n\0"), Some(ContainerKind::Pnm));
        assert_eq!(ContainerKind::probe(b"P7\nWIDTH 1\n"), Some(ContainerKind::Pnm));
        assert_eq!(ContainerKind::probe(b"\x89PNG\r\n\x1a\n...."), Some(ContainerKind::Png));
        assert_eq!(ContainerKind::probe(b"II*\0\x08\0\0\0"), Some(ContainerKind::Tiff));
        assert_eq!(ContainerKind::probe(b"MM\0*\0\0\0\x08"), Some(ContainerKind::Tiff));
        assert_eq!(ContainerKind::probe(b"GIF89a"), None);
        assert_eq!(ContainerKind::probe(b"P9"), None);
    }

    #[test]
    fn test_empty_source_is_distinct() {
        let err = ImageDemuxer::open(Path::new("empty.pgm"), Vec::new()).unwrap_err();
        assert!(matches!(err, ImageIoError::EmptySource { .. }));

        let err = ImageDemuxer::open(Path::new("junk.bin"), b"junk".to_vec()).unwrap_err();
        assert!(matches!(err, ImageIoError::Open { .. }));
    }

    #[test]
    fn test_single_packet_on_stream_zero() {
        let data = b"P5\n2 1\n255\n\x00\xff".to_vec();
        let mut demuxer = ImageDemuxer::open(Path::new("a.pgm"), data.clone()).unwrap();

        assert_eq!(demuxer.streams().len(), 1);
        assert_eq!(demuxer.streams()[0].codec, CodecId::Pnm);
        assert_eq!(demuxer.streams()[0].dimensions, Some((2, 1)));

        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.stream_index, 0);
        assert_eq!(packet.data, data);
        assert_eq!(demuxer.read_packet().unwrap(), None);
    }
}
