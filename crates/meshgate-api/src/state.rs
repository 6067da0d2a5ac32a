//! Shared handler state.

use std::path::PathBuf;
use std::sync::Arc;

use meshgate_core::ImageWorkflow;
use meshgate_telemetry::Metrics;

/// Settings the HTTP surface needs beyond the workflow itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Directory holding per-request workspaces, served under `/output`.
    pub output_root: PathBuf,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

pub(crate) struct ApiState {
    pub(crate) workflow: Arc<dyn ImageWorkflow>,
    pub(crate) telemetry: Metrics,
    pub(crate) output_root: PathBuf,
}

impl ApiState {
    pub(crate) const fn new(
        workflow: Arc<dyn ImageWorkflow>,
        telemetry: Metrics,
        output_root: PathBuf,
    ) -> Self {
        Self {
            workflow,
            telemetry,
            output_root,
        }
    }
}
