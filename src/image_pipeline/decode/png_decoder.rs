//! PNG decoder backed by the `png` crate.
//!
//! The stream is decoded without transformations so the native layout is
//! preserved: 1-bit grayscale stays packed, indexed images keep their palette.

use std::io::Cursor;

use png::{BitDepth, ColorType, Transformations};
use tracing::debug;

use crate::image_pipeline::decode::codec::{check_stream, unpack_samples, DecodedFrame, FrameDecoder, NativePixelFormat};
use crate::image_pipeline::decode::container::{Packet, StreamInfo};
use crate::image_pipeline::decode::palette::palette_plane;
use crate::image_pipeline::frame::Plane;

#[derive(Debug, Default)]
pub struct PngFrameDecoder;

impl FrameDecoder for PngFrameDecoder {
    fn name(&self) -> &'static str {
        "png"
    }

    fn open(&mut self, stream: &StreamInfo) -> Result<(), String> {
        check_stream(stream)
    }

    fn decode(&mut self, packet: &Packet) -> Result<Option<DecodedFrame>, String> {
        let mut decoder = png::Decoder::new(Cursor::new(packet.data.as_slice()));
        decoder.set_transformations(Transformations::IDENTITY);
        let mut reader = decoder.read_info().map_err(|e| e.to_string())?;

        let mut buf = vec![0u8; reader.output_buffer_size()];
        let output = reader.next_frame(&mut buf).map_err(|e| e.to_string())?;
        let (width, height, line_size) = (output.width, output.height, output.line_size);
        debug!(
            "PNG {}x{} {:?} {:?}, {} bytes per row",
            width, height, output.color_type, output.bit_depth, line_size
        );
        buf.truncate(line_size * height as usize);

        let depth_bits = output.bit_depth as u8;
        let frame = |format, planes| DecodedFrame { width, height, format, planes };

        let decoded = match (output.color_type, output.bit_depth) {
            (ColorType::Grayscale, BitDepth::One) => {
                frame(NativePixelFormat::MonoBlack, vec![Plane::new(buf, line_size)])
            }
            (ColorType::Grayscale, BitDepth::Two | BitDepth::Four) => {
                let max = (1u16 << depth_bits) - 1;
                let data = unpack_rows(&buf, line_size, depth_bits, width, height, |v| {
                    (v as u16 * 255 / max) as u8
                });
                frame(NativePixelFormat::Gray8, vec![Plane::new(data, width as usize)])
            }
            (ColorType::Grayscale, BitDepth::Eight) => {
                frame(NativePixelFormat::Gray8, vec![Plane::new(buf, line_size)])
            }
            (ColorType::GrayscaleAlpha, BitDepth::Eight) => {
                frame(NativePixelFormat::GrayAlpha8, vec![Plane::new(buf, line_size)])
            }
            (ColorType::Rgb, BitDepth::Eight) => {
                frame(NativePixelFormat::Rgb24, vec![Plane::new(buf, line_size)])
            }
            (ColorType::Indexed, depth) => {
                let info = reader.info();
                let rgb = info.palette.as_deref().ok_or("indexed PNG without PLTE chunk")?;
                let alpha = info.trns.as_deref().unwrap_or(&[]);
                let entries: Vec<u32> = rgb
                    .chunks_exact(3)
                    .enumerate()
                    .map(|(i, c)| {
                        let a = alpha.get(i).copied().unwrap_or(u8::MAX) as u32;
                        a << 24 | (c[0] as u32) << 16 | (c[1] as u32) << 8 | c[2] as u32
                    })
                    .collect();

                let indices = if depth == BitDepth::Eight {
                    Plane::new(buf, line_size)
                } else {
                    let data = unpack_rows(&buf, line_size, depth_bits, width, height, |v| v);
                    Plane::new(data, width as usize)
                };
                frame(NativePixelFormat::Pal8, vec![indices, palette_plane(&entries)])
            }
            (ColorType::Grayscale, _) => frame(NativePixelFormat::Gray16, vec![Plane::new(buf, line_size)]),
            (ColorType::GrayscaleAlpha, _) => {
                frame(NativePixelFormat::GrayAlpha16, vec![Plane::new(buf, line_size)])
            }
            (ColorType::Rgb, _) => frame(NativePixelFormat::Rgb48, vec![Plane::new(buf, line_size)]),
            (ColorType::Rgba, BitDepth::Eight) => {
                frame(NativePixelFormat::Rgba32, vec![Plane::new(buf, line_size)])
            }
            (ColorType::Rgba, _) => frame(NativePixelFormat::Rgba64, vec![Plane::new(buf, line_size)]),
        };

        Ok(Some(decoded))
    }
}

/// Unpacks sub-byte samples to one byte per pixel, mapping each through `map`.
fn unpack_rows(
    buf: &[u8],
    line_size: usize,
    bits: u8,
    width: u32,
    height: u32,
    map: impl Fn(u8) -> u8,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(width as usize * height as usize);
    for row in buf.chunks(line_size).take(height as usize) {
        out.extend(unpack_samples(row, bits, width as usize).map(&map));
    }
    out
}
