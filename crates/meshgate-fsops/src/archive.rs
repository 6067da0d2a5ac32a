//! Packaging generated artifacts into a single deflate archive.
//!
//! # Design
//! - Every member is checked before the archive file is opened.
//! - The archive is written under a hidden partial name and renamed into place,
//!   so the final name only ever refers to a complete archive.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use meshgate_core::OutputFileSet;
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{FsOpsError, FsOpsResult};

/// Write `<output_dir>/<archive_name>` containing every file named by `outputs`.
///
/// Members are stored flat under their own file names, in `outputs` order.
/// A file named twice is stored once.
///
/// # Errors
///
/// Returns an error when a member name is not a plain file name, a member is
/// missing from `output_dir`, or the archive cannot be written. No file is
/// left at the final archive path in that case.
pub fn package(
    output_dir: &Path,
    archive_name: &str,
    outputs: &OutputFileSet,
) -> FsOpsResult<PathBuf> {
    let members = collect_members(output_dir, outputs)?;
    let final_path = output_dir.join(archive_name);
    let partial_path = output_dir.join(format!(".{archive_name}.partial"));

    if let Err(err) = write_archive(&partial_path, output_dir, &members) {
        discard_partial(&partial_path);
        return Err(err);
    }
    if let Err(source) = fs::rename(&partial_path, &final_path) {
        discard_partial(&partial_path);
        return Err(FsOpsError::io("archive.rename", &final_path, source));
    }

    debug!(
        archive = %final_path.display(),
        members = members.len(),
        "archive written"
    );
    Ok(final_path)
}

/// Whether `name` is a single normal path component without separators.
#[must_use]
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn collect_members<'a>(
    output_dir: &Path,
    outputs: &'a OutputFileSet,
) -> FsOpsResult<Vec<&'a str>> {
    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(outputs.len());
    for name in outputs.file_names() {
        if !is_plain_file_name(name) {
            return Err(FsOpsError::invalid_output("not_a_plain_file_name", name));
        }
        let is_file = fs::metadata(output_dir.join(name)).is_ok_and(|meta| meta.is_file());
        if !is_file {
            return Err(FsOpsError::invalid_output("missing", name));
        }
        if seen.insert(name) {
            members.push(name);
        }
    }
    Ok(members)
}

fn write_archive(partial_path: &Path, output_dir: &Path, members: &[&str]) -> FsOpsResult<()> {
    let file = File::create(partial_path)
        .map_err(|source| FsOpsError::io("archive.create", partial_path, source))?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for name in members {
        let member_path = output_dir.join(name);
        let mut member = File::open(&member_path)
            .map_err(|source| FsOpsError::io("archive.open_member", &member_path, source))?;
        writer
            .start_file(*name, options)
            .map_err(|source| FsOpsError::zip("archive.start_file", partial_path, source))?;
        io::copy(&mut member, &mut writer)
            .map_err(|source| FsOpsError::io("archive.write_member", &member_path, source))?;
    }

    let file = writer
        .finish()
        .map_err(|source| FsOpsError::zip("archive.finish", partial_path, source))?;
    file.sync_all()
        .map_err(|source| FsOpsError::io("archive.sync", partial_path, source))
}

fn discard_partial(partial_path: &Path) {
    match fs::remove_file(partial_path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            path = %partial_path.display(),
            error = %err,
            "failed to remove partial archive"
        ),
    }
}
