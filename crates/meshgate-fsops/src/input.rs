//! Input validation and materialization.
//!
//! Validation is side-effect free so rejected requests never touch the
//! filesystem. A failed materialization leaves nothing behind in the input root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use meshgate_core::{ImageSource, InputError, InputOrigin};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};

/// Input file ready to hand to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// Location the processor reads from.
    pub path: PathBuf,
    /// Whether the service owns (and must later delete) the file.
    pub origin: InputOrigin,
}

/// Check that a request carries a usable image.
///
/// # Errors
///
/// - [`InputError::NoImageProvided`] when `source` is `None`.
/// - [`InputError::EmptyFilename`] for an upload without a filename.
/// - [`InputError::FileNotFound`] for a reference that does not exist or
///   cannot be inspected.
pub fn validate_source(source: Option<&ImageSource>) -> Result<&ImageSource, InputError> {
    match source {
        None => Err(InputError::NoImageProvided),
        Some(ImageSource::Upload { filename, .. }) if filename.is_empty() => {
            Err(InputError::EmptyFilename)
        }
        Some(ImageSource::Reference { path }) if !path.try_exists().unwrap_or(false) => {
            Err(InputError::FileNotFound { path: path.clone() })
        }
        Some(source) => Ok(source),
    }
}

/// Validate `source` and take ownership of it.
///
/// # Errors
///
/// Same as [`validate_source`].
pub fn accept_source(source: Option<ImageSource>) -> Result<ImageSource, InputError> {
    validate_source(source.as_ref())?;
    source.ok_or(InputError::NoImageProvided)
}

/// Staging location for an upload: `<input_root>/<id>.<ext>` or `<input_root>/<id>`.
#[must_use]
pub fn upload_path(input_root: &Path, request_id: Uuid, filename: &str) -> PathBuf {
    let stem = request_id.to_string();
    match Path::new(filename).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => input_root.join(format!("{stem}.{ext}")),
        _ => input_root.join(stem),
    }
}

/// Produce the on-disk input for a validated source.
///
/// Uploads are written to the input root; references are returned untouched.
///
/// # Errors
///
/// Returns an error when an upload cannot be written.
pub fn materialize(
    input_root: &Path,
    request_id: Uuid,
    source: ImageSource,
) -> FsOpsResult<ResolvedInput> {
    match source {
        ImageSource::Upload { filename, payload } => {
            let path = upload_path(input_root, request_id, &filename);
            if let Err(source) = fs::write(&path, &payload) {
                // A failed write may still have created a truncated file.
                discard_partial(&path);
                return Err(FsOpsError::io("input.write_upload", &path, source));
            }
            debug!(
                request_id = %request_id,
                client_filename = %filename,
                path = %path.display(),
                bytes = payload.len(),
                "upload staged"
            );
            Ok(ResolvedInput {
                path,
                origin: InputOrigin::Uploaded,
            })
        }
        ImageSource::Reference { path } => Ok(ResolvedInput {
            path,
            origin: InputOrigin::Referenced,
        }),
    }
}

fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "partial upload removed"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            path = %path.display(),
            error = %err,
            "failed to remove partial upload"
        ),
    }
}
