//! Canonical pixel formats and their buffer layout

use std::fmt;
use std::str::FromStr;

/// Number of entries in a `Palette8` colour table.
pub const PALETTE_ENTRIES: usize = 256;

/// Size in bytes of the colour table plane (`PALETTE_ENTRIES` little-endian `0xAARRGGBB` words).
pub const PALETTE_PLANE_BYTES: usize = PALETTE_ENTRIES * 4;

/// The in-memory raster encodings understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 3 bytes per pixel, R, G, B interleaved
    Rgb24,
    /// 1 byte per pixel
    Gray8,
    /// 2 bytes per pixel, gray then alpha; alpha is ignored on output
    GrayAlpha8,
    /// 1 bit per pixel, MSB first, set bits are white
    MonoBlack,
    /// 1 bit per pixel, MSB first, set bits are black
    MonoWhite,
    /// 1 byte index per pixel plus a second plane holding the colour table.
    /// Only produced transiently while decoding.
    Palette8,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgb24,
        PixelFormat::Gray8,
        PixelFormat::GrayAlpha8,
        PixelFormat::MonoBlack,
        PixelFormat::MonoWhite,
        PixelFormat::Palette8,
    ];

    pub fn planes(self) -> usize {
        match self {
            PixelFormat::Palette8 => 2,
            _ => 1,
        }
    }

    /// Bits occupied by one pixel in plane 0.
    pub fn bits_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 24,
            PixelFormat::GrayAlpha8 => 16,
            PixelFormat::Gray8 | PixelFormat::Palette8 => 8,
            PixelFormat::MonoBlack | PixelFormat::MonoWhite => 1,
        }
    }

    /// Smallest valid stride of plane 0 for an image `width` pixels wide.
    pub fn min_stride(self, width: u32) -> usize {
        (width as usize * self.bits_per_pixel()).div_ceil(8)
    }

    /// Smallest valid stride of `plane` for an image `width` pixels wide.
    pub fn plane_min_stride(self, plane: usize, width: u32) -> usize {
        match (self, plane) {
            (PixelFormat::Palette8, 1) => PALETTE_PLANE_BYTES,
            _ => self.min_stride(width),
        }
    }

    /// Number of rows stored in `plane` for an image `height` pixels tall.
    pub fn plane_rows(self, plane: usize, height: u32) -> usize {
        match (self, plane) {
            (PixelFormat::Palette8, 1) => 1,
            _ => height as usize,
        }
    }

    pub fn is_monochrome(self) -> bool {
        matches!(self, PixelFormat::MonoBlack | PixelFormat::MonoWhite)
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::GrayAlpha8)
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Gray8 => "gray8",
            PixelFormat::GrayAlpha8 => "grayalpha8",
            PixelFormat::MonoBlack => "monoblack",
            PixelFormat::MonoWhite => "monowhite",
            PixelFormat::Palette8 => "pal8",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb24" | "rgb" => Ok(PixelFormat::Rgb24),
            "gray8" | "gray" => Ok(PixelFormat::Gray8),
            "grayalpha8" | "ya8" => Ok(PixelFormat::GrayAlpha8),
            "monoblack" => Ok(PixelFormat::MonoBlack),
            "monowhite" | "mono" => Ok(PixelFormat::MonoWhite),
            "pal8" => Ok(PixelFormat::Palette8),
            other => Err(format!("unknown pixel format '{other}'")),
        }
    }
}
