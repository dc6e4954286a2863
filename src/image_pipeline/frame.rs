//! In-memory image representation
//!
//! This module defines the canonical pixel formats and the owned `Image`
//! buffer passed between pipeline stages.

mod image;
mod pixel;
pub mod pixel_format;

pub use image::{Image, Plane, Rect};
pub use pixel::{Pixel, MONO_THRESHOLD};
pub use pixel_format::{PixelFormat, PALETTE_ENTRIES, PALETTE_PLANE_BYTES};
