//! TIFF decoder implementation using the tiff library.
//!
//! Only the first image directory is decoded. The tiff library normalizes
//! `WhiteIsZero` rasters so that zero is black, which makes bi-level pages
//! `MonoBlack` regardless of their stored photometric interpretation.
//!
//! The tiff library refuses `RGBPalette` rasters, so uncompressed palette
//! strips are read here from the directory tags.

use std::io::{Cursor, Read, Seek};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::{debug, warn};

use crate::image_pipeline::decode::codec::{check_stream, DecodedFrame, FrameDecoder, NativePixelFormat};
use crate::image_pipeline::decode::container::{Packet, StreamInfo};
use crate::image_pipeline::decode::palette::palette_plane;
use crate::image_pipeline::frame::Plane;

#[derive(Debug, Default)]
pub struct TiffFrameDecoder;

impl FrameDecoder for TiffFrameDecoder {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn open(&mut self, stream: &StreamInfo) -> Result<(), String> {
        check_stream(stream)
    }

    fn decode(&mut self, packet: &Packet) -> Result<Option<DecodedFrame>, String> {
        debug!("Decoding TIFF image, {} bytes", packet.data.len());

        let mut decoder = Decoder::new(Cursor::new(packet.data.as_slice()))
            .map_err(|e| e.to_string())?;
        let (width, height) = decoder.dimensions().map_err(|e| e.to_string())?;

        let photometric = decoder
            .find_tag_unsigned::<u16>(Tag::PhotometricInterpretation)
            .map_err(|e| e.to_string())?;
        if photometric == Some(PHOTOMETRIC_RGB_PALETTE) {
            return decode_palette(&mut decoder, &packet.data, width, height).map(Some);
        }

        let color_type = decoder.colortype().map_err(|e| e.to_string())?;

        debug!("TIFF {}x{} {:?}", width, height, color_type);

        if decoder.more_images() {
            warn!("TIFF holds more than one image, decoding the first only");
        }

        let image = decoder.read_image().map_err(|e| e.to_string())?;

        let (format, samples) = match color_type {
            ColorType::Gray(1) => (NativePixelFormat::MonoBlack, 1),
            ColorType::Gray(8) => (NativePixelFormat::Gray8, 1),
            ColorType::GrayA(8) => (NativePixelFormat::GrayAlpha8, 2),
            ColorType::RGB(8) => (NativePixelFormat::Rgb24, 3),
            ColorType::Gray(16) => (NativePixelFormat::Gray16, 1),
            ColorType::GrayA(16) => (NativePixelFormat::GrayAlpha16, 2),
            ColorType::RGB(16) => (NativePixelFormat::Rgb48, 3),
            ColorType::RGBA(8) => (NativePixelFormat::Rgba32, 4),
            ColorType::RGBA(16) => (NativePixelFormat::Rgba64, 4),
            ColorType::CMYK(8) => (NativePixelFormat::Cmyk32, 4),
            _ => (NativePixelFormat::Other, 1),
        };

        let data = match image {
            DecodingResult::U8(data) => data,
            // Wide layouts are never canonical; keep their bytes for completeness.
            DecodingResult::U16(data) => data.iter().flat_map(|v| v.to_ne_bytes()).collect(),
            _ => Vec::new(),
        };

        let stride = match format {
            NativePixelFormat::MonoBlack => (width as usize).div_ceil(8),
            NativePixelFormat::Gray16
            | NativePixelFormat::GrayAlpha16
            | NativePixelFormat::Rgb48
            | NativePixelFormat::Rgba64 => width as usize * samples * 2,
            _ => width as usize * samples,
        };

        Ok(Some(DecodedFrame { width, height, format, planes: vec![Plane::new(data, stride)] }))
    }
}

const PHOTOMETRIC_RGB_PALETTE: u16 = 3;
const COMPRESSION_NONE: u32 = 1;

fn tag_or<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag, default: u32) -> Result<u32, String> {
    decoder
        .find_tag_unsigned::<u32>(tag)
        .map(|value| value.unwrap_or(default))
        .map_err(|e| e.to_string())
}

/// Reads an uncompressed, strip-organised palette raster into a `Pal8`
/// frame. Sub-byte indices (1, 2 or 4 bits) are widened to one byte each.
fn decode_palette<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<DecodedFrame, String> {
    let bits = tag_or(decoder, Tag::BitsPerSample, 1)?;
    let samples = tag_or(decoder, Tag::SamplesPerPixel, 1)?;
    if !matches!(bits, 1 | 2 | 4 | 8) || samples != 1 {
        return Err(format!("palette TIFF with {samples} samples of {bits} bits is not supported"));
    }
    let compression = tag_or(decoder, Tag::Compression, COMPRESSION_NONE)?;
    if compression != COMPRESSION_NONE {
        return Err(format!("compressed palette TIFF (method {compression}) is not supported"));
    }

    let offsets = decoder
        .get_tag_u64_vec(Tag::StripOffsets)
        .map_err(|e| format!("palette TIFF without strips: {e}"))?;
    let counts = decoder
        .get_tag_u64_vec(Tag::StripByteCounts)
        .map_err(|e| format!("palette TIFF without strip byte counts: {e}"))?;
    if offsets.len() != counts.len() {
        return Err(format!("{} strip offsets for {} byte counts", offsets.len(), counts.len()));
    }

    let row_bytes = (width as usize * bits as usize).div_ceil(8);
    let needed = row_bytes * height as usize;
    let mut raster = Vec::with_capacity(needed);
    for (&offset, &count) in offsets.iter().zip(&counts) {
        let strip = usize::try_from(offset)
            .ok()
            .zip(usize::try_from(count).ok())
            .and_then(|(start, len)| data.get(start..start.checked_add(len)?))
            .ok_or_else(|| format!("strip at offset {offset} ({count} bytes) lies outside the file"))?;
        raster.extend_from_slice(strip);
        if raster.len() >= needed {
            break;
        }
    }
    if raster.len() < needed {
        return Err(format!("palette raster holds {} of {} bytes", raster.len(), needed));
    }
    raster.truncate(needed);

    let indices = if bits == 8 {
        raster
    } else {
        raster
            .chunks_exact(row_bytes)
            .flat_map(|row| (0..width as usize).map(move |x| sub_byte_index(row, x, bits as usize)))
            .collect()
    };

    let color_map = decoder
        .get_tag_u16_vec(Tag::ColorMap)
        .map_err(|e| format!("palette image without usable ColorMap: {e}"))?;
    debug!("TIFF palette {}x{}, {} bits, {} ColorMap values", width, height, bits, color_map.len());

    Ok(DecodedFrame {
        width,
        height,
        format: NativePixelFormat::Pal8,
        planes: vec![Plane::new(indices, width as usize), palette_plane(&color_map_entries(&color_map)?)],
    })
}

fn sub_byte_index(row: &[u8], x: usize, bits: usize) -> u8 {
    let bit = x * bits;
    let shift = 8 - bits - bit % 8;
    (row[bit / 8] >> shift) & ((1u8 << bits) - 1)
}

/// Converts a TIFF ColorMap (all reds, then all greens, then all blues,
/// 16 bits each) into `0xAARRGGBB` words.
fn color_map_entries(color_map: &[u16]) -> Result<Vec<u32>, String> {
    if color_map.is_empty() || color_map.len() % 3 != 0 {
        return Err(format!("malformed ColorMap with {} values", color_map.len()));
    }
    let n = color_map.len() / 3;
    let (reds, rest) = color_map.split_at(n);
    let (greens, blues) = rest.split_at(n);
    Ok(reds
        .iter()
        .zip(greens)
        .zip(blues)
        .map(|((&r, &g), &b)| 0xFF00_0000 | ((r >> 8) as u32) << 16 | ((g >> 8) as u32) << 8 | (b >> 8) as u32)
        .collect())
}
