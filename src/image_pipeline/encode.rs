//! Image encoding module
//!
//! This module maps a canonical pixel format to a PNM output codec and writes
//! the image as a single-frame file.

mod codec;
mod encoder;
mod muxer;
mod pnm_encoder;
mod writer;

#[cfg(test)]
mod tests;

pub use codec::OutputCodec;
pub use encoder::Encoder;
pub use muxer::{ImageMuxer, StreamParams, CONTAINER_NAME};
pub use pnm_encoder::{EncodedPacket, PnmEncoder};
pub use writer::ImageWriter;
