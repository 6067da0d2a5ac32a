//! Per-request output directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};

/// Output directory owned by exactly one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Identifier naming the directory.
    pub request_id: Uuid,
    /// `<output_root>/<request_id>`.
    pub output_dir: PathBuf,
}

/// Create `<output_root>/<request_id>`, succeeding when it already exists.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn allocate_in(output_root: &Path, request_id: Uuid) -> FsOpsResult<Workspace> {
    let output_dir = output_root.join(request_id.to_string());
    fs::create_dir_all(&output_dir)
        .map_err(|source| FsOpsError::io("workspace.create", &output_dir, source))?;
    debug!(request_id = %request_id, path = %output_dir.display(), "workspace allocated");
    Ok(Workspace {
        request_id,
        output_dir,
    })
}

/// Create each root directory if missing.
///
/// # Errors
///
/// Returns an error for the first root that cannot be created.
pub fn ensure_roots(roots: &[&Path]) -> FsOpsResult<()> {
    for root in roots {
        fs::create_dir_all(root)
            .map_err(|source| FsOpsError::io("workspace.ensure_root", *root, source))?;
    }
    Ok(())
}
