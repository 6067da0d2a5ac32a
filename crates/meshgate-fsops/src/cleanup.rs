//! Removal of transient inputs once a request has finished.

use std::fs;
use std::io;

use tracing::{debug, warn};

use crate::input::ResolvedInput;

/// What happened to a resolved input during finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Referenced inputs belong to the caller and are left alone.
    Retained,
    /// The staged upload was deleted.
    Removed,
    /// The staged upload was already gone.
    AlreadyAbsent,
    /// Deletion failed; the file may still exist.
    Failed,
}

/// Delete `input` when the service owns it.
///
/// Never fails: removal errors are logged and reported as
/// [`CleanupOutcome::Failed`] so they cannot replace the request result.
pub fn discard_transient(input: &ResolvedInput) -> CleanupOutcome {
    if !input.origin.is_transient() {
        return CleanupOutcome::Retained;
    }
    match fs::remove_file(&input.path) {
        Ok(()) => {
            debug!(path = %input.path.display(), "transient input removed");
            CleanupOutcome::Removed
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => CleanupOutcome::AlreadyAbsent,
        Err(err) => {
            warn!(
                path = %input.path.display(),
                error = %err,
                "failed to remove transient input"
            );
            CleanupOutcome::Failed
        }
    }
}
