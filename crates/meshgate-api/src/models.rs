//! JSON bodies returned by the HTTP surface.

use meshgate_core::{OutputFileSet, ProcessedRequest};
use serde::Serialize;
use uuid::Uuid;

const STATUS_SUCCESS: &str = "success";

/// Body of a successful `POST /process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// Identifier of the request and its workspace.
    pub request_id: Uuid,
    /// Output names mapped to file names, in processor order.
    pub output_files: OutputFileSet,
    /// Archive path relative to `/output`.
    pub zip_file: String,
    /// Absolute URL prefix under which the outputs are served.
    pub base_url: String,
}

impl From<ProcessedRequest> for ProcessResponse {
    fn from(processed: ProcessedRequest) -> Self {
        Self {
            status: STATUS_SUCCESS,
            request_id: processed.request_id,
            output_files: processed.output_files,
            zip_file: processed.archive_reference,
            base_url: processed.base_location,
        }
    }
}

/// Body of a successful `POST /initialize`.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// Freshly generated identifier, not tied to any workspace.
    pub request_id: Uuid,
}

impl InitializeResponse {
    pub(crate) const fn new(request_id: Uuid) -> Self {
        Self {
            status: STATUS_SUCCESS,
            request_id,
        }
    }
}

/// Body of every failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Human-readable failure message.
    pub error: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: &'static str,
    /// Build identifier recorded at startup.
    pub build: String,
    /// Processing requests currently running.
    pub in_flight: i64,
}
