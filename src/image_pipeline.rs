//! Image input/output pipeline module
//!
//! This module loads still images into a canonical in-memory representation,
//! saves them as PBM, PGM or PPM files, and dumps intermediate snapshots for
//! debugging.

pub mod common;
pub mod conversions;
pub mod debug_sink;
pub mod decode;
pub mod diagnostics;
pub mod encode;
pub mod frame;

pub use common::{ErrorKind, ImageIoError, PipelineConfig, PipelineConfigBuilder, Result, Verbosity};

pub use frame::{Image, Pixel, PixelFormat, Plane, Rect, MONO_THRESHOLD};

pub use decode::{Decoder, ImageReader};

pub use encode::{Encoder, ImageWriter, OutputCodec};

pub use debug_sink::{format_template, DebugSink};

pub use conversions::{Pipeline, Stage, StageTimings};
