//! Common utilities module
//!
//! This module contains the error taxonomy and configuration shared across the image pipeline.

pub mod config;
pub mod error;

pub use config::{PipelineConfig, PipelineConfigBuilder, Verbosity};
pub use error::{ErrorKind, ImageIoError, Result};
