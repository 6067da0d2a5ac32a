//! Filesystem facade bound to the configured storage roots.

use std::path::{Path, PathBuf};

use meshgate_core::{ImageSource, OutputFileSet};
use meshgate_telemetry::Metrics;
use uuid::Uuid;

use crate::archive;
use crate::cleanup::{self, CleanupOutcome};
use crate::error::FsOpsResult;
use crate::input::{self, ResolvedInput};
use crate::workspace::{self, Workspace};

/// Storage operations for one service instance.
#[derive(Clone)]
pub struct FsOpsService {
    input_root: PathBuf,
    output_root: PathBuf,
    archive_name: String,
    metrics: Metrics,
}

impl FsOpsService {
    /// Bind the service to its roots and archive name.
    #[must_use]
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        archive_name: impl Into<String>,
        metrics: Metrics,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            archive_name: archive_name.into(),
            metrics,
        }
    }

    /// Staging area for uploads.
    #[must_use]
    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// Parent of every workspace.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Create both roots if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when either root cannot be created.
    pub fn ensure_roots(&self) -> FsOpsResult<()> {
        workspace::ensure_roots(&[&self.input_root, &self.output_root])
    }

    /// Allocate a workspace under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn allocate(&self) -> FsOpsResult<Workspace> {
        self.allocate_for(Uuid::new_v4())
    }

    /// Allocate (or reuse) the workspace for `request_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn allocate_for(&self, request_id: Uuid) -> FsOpsResult<Workspace> {
        workspace::allocate_in(&self.output_root, request_id)
    }

    /// Stage `source` for the processor.
    ///
    /// # Errors
    ///
    /// Returns an error when an upload cannot be written.
    pub fn materialize(
        &self,
        request_id: Uuid,
        source: ImageSource,
    ) -> FsOpsResult<ResolvedInput> {
        input::materialize(&self.input_root, request_id, source)
    }

    /// Package the files named by `outputs` into the workspace archive.
    ///
    /// # Errors
    ///
    /// See [`archive::package`].
    pub fn package(&self, workspace: &Workspace, outputs: &OutputFileSet) -> FsOpsResult<PathBuf> {
        archive::package(&workspace.output_dir, &self.archive_name, outputs)
    }

    /// `<request_id>/<archive_name>`, relative to the output root.
    #[must_use]
    pub fn archive_reference(&self, request_id: Uuid) -> String {
        format!("{request_id}/{}", self.archive_name)
    }

    /// Remove a transient input, counting failures.
    pub fn discard_transient(&self, input: &ResolvedInput) -> CleanupOutcome {
        let outcome = cleanup::discard_transient(input);
        if outcome == CleanupOutcome::Failed {
            self.metrics.inc_transient_cleanup_failure();
        }
        outcome
    }
}
