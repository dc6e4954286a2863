//! Pipeline conversions module
//!
//! This module contains the load/save orchestration used by the command line
//! driver and by embedding tools.

mod pipeline;
mod timing;


pub use pipeline::Pipeline;
pub use timing::{Stage, StageTimings};
