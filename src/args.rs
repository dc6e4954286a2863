//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use pagescan_io_rs::image_pipeline::{PixelFormat, Verbosity};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// True color, written as PPM
    Rgb24,
    /// 8-bit grayscale, written as PGM
    Gray8,
    /// Grayscale with alpha; alpha is dropped and the result written as PGM
    Grayalpha8,
    /// Bi-level, written as PBM
    Monoblack,
    /// Bi-level, written as PBM
    Monowhite,
}

impl OutputFormat {
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            OutputFormat::Rgb24 => PixelFormat::Rgb24,
            OutputFormat::Gray8 => PixelFormat::Gray8,
            OutputFormat::Grayalpha8 => PixelFormat::GrayAlpha8,
            OutputFormat::Monoblack => PixelFormat::MonoBlack,
            OutputFormat::Monowhite => PixelFormat::MonoWhite,
        }
    }
}

/// Load a PNM, PNG or TIFF image and save it as PBM, PGM or PPM
#[derive(Debug, Parser)]
#[command(name = "pagescan-io", version)]
pub struct Args {
    /// Input image
    pub input: PathBuf,

    /// Output file
    pub output: PathBuf,

    /// Output pixel format (defaults to the input's format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Increase verbosity (-v normal, -vv container dumps, -vvv debug, -vvvv debug snapshots)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Reject images wider or taller than this (0 disables the check)
    #[arg(long, default_value_t = 65535)]
    pub max_dimension: u32,

    /// Filename template for debug snapshots, e.g. "debug%02d.pnm"
    #[arg(long)]
    pub debug_template: Option<String>,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::from_occurrences(self.verbose)
        }
    }

    pub fn max_dimension(&self) -> Option<u32> {
        (self.max_dimension > 0).then_some(self.max_dimension)
    }
}
