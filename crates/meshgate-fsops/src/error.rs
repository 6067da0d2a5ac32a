//! # Design
//!
//! - Provide structured, constant-message errors for filesystem operations.
//! - Capture operation context (paths, fields, inputs) so failures are reproducible in tests.
//! - Preserve source errors without interpolating context into `Display`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by workspace, input, and archive handling.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Zip archive failures.
    #[error("fsops zip failure")]
    Zip {
        /// Operation that triggered the archive failure.
        operation: &'static str,
        /// Path involved in the archive failure.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: zip::result::ZipError,
    ) -> Self {
        Self::Zip {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_output(reason: &'static str, name: &str) -> Self {
        Self::InvalidInput {
            field: "output_file",
            reason,
            value: Some(name.to_string()),
        }
    }

    /// One-line description suitable for an error response body.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Io {
                operation,
                path,
                source,
            } => format!("{operation} {}: {source}", path.display()),
            Self::Zip {
                operation, source, ..
            } => format!("{operation}: {source}"),
            Self::InvalidInput {
                field,
                reason,
                value: Some(value),
            } => format!("{field} {reason}: {value}"),
            Self::InvalidInput {
                field,
                reason,
                value: None,
            } => format!("{field} {reason}"),
        }
    }
}
