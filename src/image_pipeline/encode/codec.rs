use std::fmt;

use crate::image_pipeline::frame::PixelFormat;

/// Output codecs of the single-image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCodec {
    /// Portable pixmap, `P6`.
    Ppm,
    /// Portable graymap, `P5`.
    Pgm,
    /// Portable bitmap, `P4`.
    Pbm,
}

impl OutputCodec {
    /// Picks the codec for a desired format and the format the codec encodes.
    ///
    /// `Palette8` has no output codec.
    pub fn select(desired: PixelFormat) -> Option<(OutputCodec, PixelFormat)> {
        match desired {
            PixelFormat::Rgb24 => Some((OutputCodec::Ppm, PixelFormat::Rgb24)),
            PixelFormat::Gray8 | PixelFormat::GrayAlpha8 => Some((OutputCodec::Pgm, PixelFormat::Gray8)),
            PixelFormat::MonoBlack | PixelFormat::MonoWhite => Some((OutputCodec::Pbm, PixelFormat::MonoWhite)),
            PixelFormat::Palette8 => None,
        }
    }

    /// The only pixel format this codec accepts.
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            OutputCodec::Ppm => PixelFormat::Rgb24,
            OutputCodec::Pgm => PixelFormat::Gray8,
            OutputCodec::Pbm => PixelFormat::MonoWhite,
        }
    }

    pub fn magic(self) -> &'static [u8; 2] {
        match self {
            OutputCodec::Ppm => b"P6",
            OutputCodec::Pgm => b"P5",
            OutputCodec::Pbm => b"P4",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputCodec::Ppm => "ppm",
            OutputCodec::Pgm => "pgm",
            OutputCodec::Pbm => "pbm",
        }
    }
}

impl fmt::Display for OutputCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
