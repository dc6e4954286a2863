use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of an [`ImageIoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source cannot be opened, has no streams, or stream 0 is not an image.
    Open,
    /// No decoder/encoder for the codec, or the codec failed to open.
    Codec,
    /// No packet, packet from an unexpected stream, or no decoded frame.
    Read,
    /// Decoded or requested pixel format outside the canonical set.
    UnsupportedFormat,
    /// Destination, header, encode, packet or trailer failure.
    Write,
    /// Invalid caller-supplied settings (templates, limits).
    Config,
    /// Inconsistent image geometry or buffer sizes.
    Buffer,
}

#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("unable to open file {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("unable to open file {path}: file is empty")]
    EmptySource { path: PathBuf },

    #[error("unable to open file {path}: missing streams")]
    MissingStreams { path: PathBuf },

    #[error("unable to open file {path}: wrong stream ({media_type})")]
    WrongStream { path: PathBuf, media_type: String },

    #[error("unable to open file {path}: unsupported format ({codec})")]
    UnsupportedCodec { path: PathBuf, codec: String },

    #[error("cannot open {codec} decoder for {path}: {reason}")]
    CodecOpen { path: PathBuf, codec: String, reason: String },

    #[error("unable to read from {path}: {reason}")]
    ReadPacket { path: PathBuf, reason: String },

    #[error("unable to open file {path}: invalid stream {stream_index}")]
    InvalidStream { path: PathBuf, stream_index: usize },

    #[error("unable to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("unable to decode {path}: decoder produced no frame")]
    NoFrame { path: PathBuf },

    #[error("unable to open file {path}: unsupported pixel format {format}")]
    UnsupportedPixelFormat { path: PathBuf, format: String },

    #[error("cannot save {path}: no output codec for pixel format {format}")]
    UnsupportedOutputFormat { path: PathBuf, format: String },

    #[error("could not open '{path}'")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to open {codec} encoder for '{path}': {reason}")]
    EncoderOpen { path: PathBuf, codec: String, reason: String },

    #[error("error writing header to '{path}': {reason}")]
    WriteHeader { path: PathBuf, reason: String },

    #[error("unable to write file {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("error writing frame to '{path}': {reason}")]
    WritePacket { path: PathBuf, reason: String },

    #[error("error writing trailer to '{path}': {reason}")]
    WriteTrailer { path: PathBuf, reason: String },

    #[error("invalid debug filename template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Invalid image buffer: {0}")]
    InvalidBuffer(String),
}

impl ImageIoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Open { .. }
            | Self::EmptySource { .. }
            | Self::MissingStreams { .. }
            | Self::WrongStream { .. } => ErrorKind::Open,
            Self::UnsupportedCodec { .. }
            | Self::CodecOpen { .. }
            | Self::EncoderOpen { .. } => ErrorKind::Codec,
            Self::ReadPacket { .. }
            | Self::InvalidStream { .. }
            | Self::Decode { .. }
            | Self::NoFrame { .. } => ErrorKind::Read,
            Self::UnsupportedPixelFormat { .. } | Self::UnsupportedOutputFormat { .. } => {
                ErrorKind::UnsupportedFormat
            }
            Self::OutputOpen { .. }
            | Self::WriteHeader { .. }
            | Self::Encode { .. }
            | Self::WritePacket { .. }
            | Self::WriteTrailer { .. } => ErrorKind::Write,
            Self::InvalidTemplate { .. } => ErrorKind::Config,
            Self::InvalidDimensions(..) | Self::InvalidBuffer(_) => ErrorKind::Buffer,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImageIoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let err = ImageIoError::MissingStreams { path: PathBuf::from("scan.pnm") };
        assert_eq!(err.to_string(), "unable to open file scan.pnm: missing streams");
        assert_eq!(err.kind(), ErrorKind::Open);

        let err = ImageIoError::WriteHeader {
            path: PathBuf::from("out.pbm"),
            reason: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "error writing header to 'out.pbm': disk full");
        assert_eq!(err.kind(), ErrorKind::Write);
    }

    #[test]
    fn test_open_failure_keeps_io_error_as_source() {
        let err = ImageIoError::OutputOpen {
            path: PathBuf::from("out.pgm"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "could not open 'out.pgm'");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("denied"));
    }

    #[test]
    fn test_load_failures_are_distinguishable() {
        let path = PathBuf::from("in.png");
        let messages = [
            ImageIoError::EmptySource { path: path.clone() }.to_string(),
            ImageIoError::MissingStreams { path: path.clone() }.to_string(),
            ImageIoError::InvalidStream { path: path.clone(), stream_index: 1 }.to_string(),
            ImageIoError::NoFrame { path: path.clone() }.to_string(),
            ImageIoError::Decode { path, reason: "crc mismatch".to_string() }.to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
