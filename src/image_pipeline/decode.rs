//! Image decoding module
//!
//! This module probes a source container, decodes the first frame of its
//! first stream and normalizes it into a canonical `Image`.

mod codec;
mod container;
mod decoder;
mod palette;
mod png_decoder;
mod pnm_decoder;
mod reader;
mod tiff_decoder;


pub use codec::{find_decoder, DecodedFrame, FrameDecoder, NativePixelFormat};
pub use container::{CodecId, ContainerKind, Demuxer, ImageDemuxer, MediaType, Packet, StreamInfo};
pub use decoder::Decoder;
pub use palette::{expand_palette, palette_plane};
pub use png_decoder::PngFrameDecoder;
pub use pnm_decoder::{parse_header as parse_pnm_header, PnmFrameDecoder, PnmHeader, PnmKind};
pub use reader::ImageReader;
pub use tiff_decoder::TiffFrameDecoder;
