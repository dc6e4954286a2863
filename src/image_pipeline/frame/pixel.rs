/// Gray level below which a pixel is stored as black in a bi-level image.
pub const MONO_THRESHOLD: u8 = 128;

/// A single RGB colour as read from or written to an [`Image`](super::Image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel { r: 0, g: 0, b: 0 };
    pub const WHITE: Pixel = Pixel { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self { r: level, g: level, b: level }
    }

    /// Colour of a packed `0xAARRGGBB` palette word; alpha is dropped.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn to_argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Unweighted channel average.
    pub fn luma(self) -> u8 {
        ((self.r as u16 + self.g as u16 + self.b as u16) / 3) as u8
    }

    pub fn is_dark(self) -> bool {
        self.luma() < MONO_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_unpacking() {
        assert_eq!(Pixel::from_argb(0xFF12_3456), Pixel::new(0x12, 0x34, 0x56));
        assert_eq!(Pixel::from_argb(0x0012_3456), Pixel::new(0x12, 0x34, 0x56));
        assert_eq!(Pixel::new(1, 2, 3).to_argb(), 0xFF01_0203);
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(Pixel::gray(127).is_dark());
        assert!(!Pixel::gray(128).is_dark());
        assert_eq!(Pixel::new(255, 0, 0).luma(), 85);
        assert!(Pixel::new(255, 0, 0).is_dark());
    }
}
