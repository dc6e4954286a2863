use std::fmt;

use crate::image_pipeline::decode::container::{CodecId, Packet, StreamInfo};
use crate::image_pipeline::decode::png_decoder::PngFrameDecoder;
use crate::image_pipeline::decode::pnm_decoder::PnmFrameDecoder;
use crate::image_pipeline::decode::tiff_decoder::TiffFrameDecoder;
use crate::image_pipeline::frame::{PixelFormat, Plane};

/// Pixel layout a codec produced, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativePixelFormat {
    Gray8,
    GrayAlpha8,
    Rgb24,
    MonoBlack,
    MonoWhite,
    Pal8,
    Gray16,
    GrayAlpha16,
    Rgb48,
    Rgba32,
    Rgba64,
    Cmyk32,
    Other,
}

impl NativePixelFormat {
    /// Canonical format this layout is stored as, if any.
    pub fn canonical(self) -> Option<PixelFormat> {
        match self {
            NativePixelFormat::Gray8 => Some(PixelFormat::Gray8),
            NativePixelFormat::GrayAlpha8 => Some(PixelFormat::GrayAlpha8),
            NativePixelFormat::Rgb24 => Some(PixelFormat::Rgb24),
            NativePixelFormat::MonoBlack => Some(PixelFormat::MonoBlack),
            NativePixelFormat::MonoWhite => Some(PixelFormat::MonoWhite),
            NativePixelFormat::Pal8 => Some(PixelFormat::Palette8),
            NativePixelFormat::Gray16
            | NativePixelFormat::GrayAlpha16
            | NativePixelFormat::Rgb48
            | NativePixelFormat::Rgba32
            | NativePixelFormat::Rgba64
            | NativePixelFormat::Cmyk32
            | NativePixelFormat::Other => None,
        }
    }
}

impl fmt::Display for NativePixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativePixelFormat::Gray8 => "gray",
            NativePixelFormat::GrayAlpha8 => "ya8",
            NativePixelFormat::Rgb24 => "rgb24",
            NativePixelFormat::MonoBlack => "monob",
            NativePixelFormat::MonoWhite => "monow",
            NativePixelFormat::Pal8 => "pal8",
            NativePixelFormat::Gray16 => "gray16",
            NativePixelFormat::GrayAlpha16 => "ya16",
            NativePixelFormat::Rgb48 => "rgb48",
            NativePixelFormat::Rgba32 => "rgba",
            NativePixelFormat::Rgba64 => "rgba64",
            NativePixelFormat::Cmyk32 => "cmyk",
            NativePixelFormat::Other => "unknown",
        };
        f.write_str(name)
    }
}

/// One decoded picture in the codec's native layout.
///
/// For `Pal8` frames, plane 1 holds the colour table as 256 little-endian
/// `0xAARRGGBB` words.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub format: NativePixelFormat,
    pub planes: Vec<Plane>,
}

pub trait FrameDecoder {
    fn name(&self) -> &'static str;

    /// Prepares the decoder for packets of `stream`.
    fn open(&mut self, stream: &StreamInfo) -> Result<(), String>;

    /// Decodes one packet; `Ok(None)` when the packet held no complete frame.
    fn decode(&mut self, packet: &Packet) -> Result<Option<DecodedFrame>, String>;
}

/// Built-in decoder for `codec`.
pub fn find_decoder(codec: CodecId) -> Option<Box<dyn FrameDecoder>> {
    match codec {
        CodecId::Pnm => Some(Box::new(PnmFrameDecoder::default())),
        CodecId::Png => Some(Box::new(PngFrameDecoder::default())),
        CodecId::Tiff => Some(Box::new(TiffFrameDecoder::default())),
        CodecId::Unknown => None,
    }
}

/// Checks announced stream geometry before decoding.
pub(crate) fn check_stream(stream: &StreamInfo) -> Result<(), String> {
    match stream.dimensions {
        Some((0, _)) | Some((_, 0)) => Err(format!(
            "stream {} announces an empty frame",
            stream.index
        )),
        _ => Ok(()),
    }
}

/// Expands packed samples of `bits` depth (MSB first) to one byte each.
pub(crate) fn unpack_samples(row: &[u8], bits: u8, count: usize) -> impl Iterator<Item = u8> + '_ {
    let per_byte = (8 / bits) as usize;
    let mask = ((1u16 << bits) - 1) as u8;
    (0..count).map(move |i| {
        let byte = row[i / per_byte];
        let shift = 8 - bits as usize * (i % per_byte + 1);
        (byte >> shift) & mask
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_mapping() {
        assert_eq!(NativePixelFormat::Pal8.canonical(), Some(PixelFormat::Palette8));
        assert_eq!(NativePixelFormat::MonoWhite.canonical(), Some(PixelFormat::MonoWhite));
        assert_eq!(NativePixelFormat::Rgba32.canonical(), None);
        assert_eq!(NativePixelFormat::Gray16.canonical(), None);
    }

    #[test]
    fn test_unknown_codec_has_no_decoder() {
        assert!(find_decoder(CodecId::Unknown).is_none());
        assert_eq!(find_decoder(CodecId::Png).map(|d| d.name()), Some("png"));
    }

    #[test]
    fn test_unpack_samples() {
        let two_bit: Vec<u8> = unpack_samples(&[0b00_01_10_11, 0b1100_0000], 2, 5).collect();
        assert_eq!(two_bit, vec![0, 1, 2, 3, 3]);

        let four_bit: Vec<u8> = unpack_samples(&[0xA5, 0xF0], 4, 3).collect();
        assert_eq!(four_bit, vec![0xA, 0x5, 0xF]);

        let one_bit: Vec<u8> = unpack_samples(&[0b1010_0000], 1, 4).collect();
        assert_eq!(one_bit, vec![1, 0, 1, 0]);
    }
}
