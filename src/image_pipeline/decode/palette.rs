//! Palette handling for indexed frames.

use crate::image_pipeline::common::error::{ImageIoError, Result};
use crate::image_pipeline::frame::{Image, Pixel, PixelFormat, Plane, PALETTE_ENTRIES, PALETTE_PLANE_BYTES};

/// Builds a colour table plane from `0xAARRGGBB` entries.
///
/// Entries beyond `entries.len()` are opaque black; extra entries are dropped.
pub fn palette_plane(entries: &[u32]) -> Plane {
    let mut data = Vec::with_capacity(PALETTE_PLANE_BYTES);
    for index in 0..PALETTE_ENTRIES {
        let argb = entries.get(index).copied().unwrap_or(0xFF00_0000);
        data.extend_from_slice(&argb.to_le_bytes());
    }
    Plane::new(data, PALETTE_PLANE_BYTES)
}

/// Resolves every index of a `Palette8` image into a new `Rgb24` image.
pub fn expand_palette(indexed: &Image) -> Result<Image> {
    if indexed.format() != PixelFormat::Palette8 {
        return Err(ImageIoError::InvalidBuffer(format!(
            "expected a pal8 image, got {}",
            indexed.format()
        )));
    }

    let table: Vec<Pixel> = indexed
        .plane(1)
        .data()
        .chunks_exact(4)
        .take(PALETTE_ENTRIES)
        .map(|c| Pixel::from_argb(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect();

    let mut output = Image::new(indexed.width(), indexed.height(), PixelFormat::Rgb24)?;
    for y in 0..indexed.height() {
        let indices = indexed.row(0, y);
        let row = output.row_mut(0, y);
        for (x, &index) in indices.iter().enumerate() {
            let pixel = table[index as usize];
            row[x * 3..x * 3 + 3].copy_from_slice(&[pixel.r, pixel.g, pixel.b]);
        }
    }
    Ok(output)
}
