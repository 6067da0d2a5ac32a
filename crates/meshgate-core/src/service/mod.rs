//! Collaborator traits implemented by processor adapters and the lifecycle controller.

use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{ProcessorError, WorkflowResult};
use crate::model::{ImageSource, OutputFileSet, ProcessedRequest};

/// External image-to-3D routine.
///
/// Both calls block the current thread for as long as inference takes; callers
/// are expected to run them on a blocking worker.
pub trait ImageProcessor: Send + Sync {
    /// Load models and other long-lived resources.
    ///
    /// # Errors
    ///
    /// Returns an error when the resources cannot be prepared.
    fn initialize(&self) -> Result<(), ProcessorError>;

    /// Generate artifacts for `input_path` inside `output_dir`.
    ///
    /// On success every file named in the returned set exists in `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when inference fails.
    fn process(&self, input_path: &Path, output_dir: &Path)
    -> Result<OutputFileSet, ProcessorError>;
}

/// Request lifecycle exposed to delivery surfaces such as the HTTP API.
#[async_trait]
pub trait ImageWorkflow: Send + Sync {
    /// Trigger processor initialisation; returns a freshly generated identifier.
    async fn initialize(&self) -> WorkflowResult<Uuid>;

    /// Run one request from input resolution through packaging.
    async fn process(&self, source: Option<ImageSource>) -> WorkflowResult<ProcessedRequest>;
}
