//! Turning pipeline errors into log records and process exit codes.

use std::process::ExitCode;

use tracing::error;

use crate::image_pipeline::common::error::{ErrorKind, ImageIoError};

/// Exit status for each error class; 0 is never returned.
pub fn exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Open => 2,
        ErrorKind::Codec => 3,
        ErrorKind::Read => 4,
        ErrorKind::UnsupportedFormat => 5,
        ErrorKind::Write => 6,
        ErrorKind::Config => 7,
        ErrorKind::Buffer => 8,
    }
}

/// `err` followed by each of its causes, separated by `": "`.
pub fn describe(err: &ImageIoError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Logs `err` with its source chain and returns the exit code for it.
pub fn report(err: &ImageIoError) -> ExitCode {
    let kind = err.kind();
    error!(kind = ?kind, "{}", describe(err));
    ExitCode::from(exit_status(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_every_kind_fails() {
        let kinds = [
            ErrorKind::Open,
            ErrorKind::Codec,
            ErrorKind::Read,
            ErrorKind::UnsupportedFormat,
            ErrorKind::Write,
            ErrorKind::Config,
            ErrorKind::Buffer,
        ];
        let mut seen = Vec::new();
        for kind in kinds {
            let status = exit_status(kind);
            assert_ne!(status, 0);
            assert!(!seen.contains(&status));
            seen.push(status);
        }
    }

    #[test]
    fn test_report_uses_kind_status() {
        let err = ImageIoError::MissingStreams { path: PathBuf::from("scan.pnm") };
        assert_eq!(exit_status(err.kind()), 2);
        let _ = report(&err);

        let err = ImageIoError::OutputOpen {
            path: PathBuf::from("out.pgm"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(exit_status(err.kind()), 6);
        let _ = report(&err);
    }

    #[test]
    fn test_io_cause_appears_once() {
        let err = ImageIoError::OutputOpen {
            path: PathBuf::from("x"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(describe(&err), "could not open 'x': denied");
    }
}
