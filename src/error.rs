//! Unified error type for goskel: maps pipeline failures to process exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status for a missing or malformed command-line invocation.
const USAGE_EXIT: u8 = 2;
/// Exit status for every other terminating failure.
const FAILURE_EXIT: u8 = 1;

#[derive(Error, Debug)]
pub enum SkelError {
    #[error("{0}")]
    Usage(String),

    #[error("failed to parse file: {}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to format output: {0}")]
    Format(String),

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, SkelError>;

impl SkelError {
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error variant.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => USAGE_EXIT,
            Self::Parse { .. } | Self::Io { .. } | Self::Format(_) | Self::Config { .. } => {
                FAILURE_EXIT
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(SkelError::Usage("--input flag is required".into()).exit_code(), 2);
        assert_eq!(SkelError::Format("boom".into()).exit_code(), 1);
        let err = SkelError::io(
            "failed to create output directory",
            "/nope/out",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_parse_error_message_carries_location() {
        let err = SkelError::Parse {
            path: PathBuf::from("pkg/model.go"),
            line: 7,
            column: 3,
            message: "missing `}`".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse file: pkg/model.go:7:3: missing `}`"
        );
    }
}
