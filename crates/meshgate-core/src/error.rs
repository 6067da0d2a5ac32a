//! Error types for request lifecycle operations.

use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

/// Client-caused rejections raised while resolving the input image.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Neither an upload nor a path reference was supplied.
    #[error("No image provided")]
    NoImageProvided,
    /// An upload was supplied with an empty client filename.
    #[error("No selected file")]
    EmptyFilename,
    /// A path reference did not resolve on the serving host.
    #[error("File not found")]
    FileNotFound {
        /// Path supplied by the caller.
        path: PathBuf,
    },
}

/// Failure reported by the external image processor.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessorError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ProcessorError {
    /// Failure described only by a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Failure wrapping an underlying error.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Message surfaced to callers.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Which side caused a request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Caller supplied unusable input.
    Input,
    /// Server-side failure during processing, packaging or setup.
    Server,
}

/// Terminal failure of a request lifecycle or initialisation call.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Input was rejected before any workspace was created.
    #[error(transparent)]
    Input(#[from] InputError),
    /// Workspace allocation or upload staging failed.
    #[error("workspace preparation failed")]
    Workspace {
        /// Human-readable failure detail.
        detail: String,
        /// Underlying filesystem failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The external processor failed or panicked.
    #[error("{message}")]
    Processing {
        /// Message reported by the processor.
        message: String,
    },
    /// Output files could not be bundled into the archive.
    #[error("archive packaging failed")]
    Packaging {
        /// Human-readable failure detail.
        detail: String,
        /// Underlying filesystem or archive failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Model initialisation failed.
    #[error("{message}")]
    Initialization {
        /// Message reported by the processor.
        message: String,
    },
}

impl WorkflowError {
    /// Classify the failure for status reporting.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Input(_) => FailureClass::Input,
            Self::Workspace { .. }
            | Self::Processing { .. }
            | Self::Packaging { .. }
            | Self::Initialization { .. } => FailureClass::Server,
        }
    }

    /// Message returned to the caller in the error body.
    #[must_use]
    pub fn caller_message(&self) -> String {
        match self {
            Self::Input(err) => err.to_string(),
            Self::Workspace { detail, .. } | Self::Packaging { detail, .. } => {
                format!("{self}: {detail}")
            }
            Self::Processing { message } | Self::Initialization { message } => message.clone(),
        }
    }
}

/// Convenience alias for workflow results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
