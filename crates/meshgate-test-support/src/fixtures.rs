//! Temporary storage roots for lifecycle and HTTP tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

/// Input, output, and library directories under one temporary root.
///
/// The library directory stands in for images that already live on the host
/// and are submitted by path.
pub struct TempStorage {
    root: TempDir,
    input_root: PathBuf,
    output_root: PathBuf,
    library_root: PathBuf,
}

impl TempStorage {
    /// Create the directory tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories cannot be created.
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new().prefix("meshgate-test-").tempdir()?;
        let input_root = root.path().join("input");
        let output_root = root.path().join("output");
        let library_root = root.path().join("library");
        for dir in [&input_root, &output_root, &library_root] {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            root,
            input_root,
            output_root,
            library_root,
        })
    }

    /// Temporary root containing every other directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Upload staging directory.
    #[must_use]
    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// Workspace parent directory.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Write an image into the library and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn library_image(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.library_root.join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// File names currently staged in the input root, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn staged_inputs(&self) -> Result<Vec<String>> {
        list_names(&self.input_root)
    }

    /// Workspace directory names under the output root, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn workspaces(&self) -> Result<Vec<String>> {
        list_names(&self.output_root)
    }
}

fn list_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_starts_empty() -> Result<()> {
        let storage = TempStorage::new()?;
        assert!(storage.staged_inputs()?.is_empty());
        assert!(storage.workspaces()?.is_empty());
        assert!(storage.input_root().starts_with(storage.root()));
        Ok(())
    }

    #[test]
    fn library_images_live_outside_the_roots() -> Result<()> {
        let storage = TempStorage::new()?;
        let image = storage.library_image("cat.png", b"png")?;
        assert!(image.is_file());
        assert!(!image.starts_with(storage.input_root()));
        assert!(storage.staged_inputs()?.is_empty());
        Ok(())
    }
}
