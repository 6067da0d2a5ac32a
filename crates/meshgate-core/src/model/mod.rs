//! Core request domain types shared across the workspace.

use std::path::PathBuf;

use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image supplied by a caller, before it is resolved to a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Binary payload uploaded by the client.
    Upload {
        /// Client-side file name; only its extension is kept.
        filename: String,
        /// Raw uploaded bytes.
        payload: Bytes,
    },
    /// Path that already exists on the serving host.
    Reference {
        /// Location of the image on the local filesystem.
        path: PathBuf,
    },
}

impl ImageSource {
    #[must_use]
    /// Convenience constructor for uploaded payloads.
    pub fn upload(filename: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self::Upload {
            filename: filename.into(),
            payload: payload.into(),
        }
    }

    #[must_use]
    /// Convenience constructor for path references.
    pub fn reference(path: impl Into<PathBuf>) -> Self {
        Self::Reference { path: path.into() }
    }
}

/// Who owns the resolved input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    /// Materialised from an upload; removed when the request finishes.
    Uploaded,
    /// Referenced by path; the caller keeps ownership.
    Referenced,
}

impl InputOrigin {
    /// Whether the input must be deleted when the request finishes.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Uploaded)
    }
}

/// Terminal or pending status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Request is still moving through its stages.
    Pending,
    /// Outputs were produced and packaged.
    Success,
    /// A stage failed.
    Failed,
}

impl RequestStatus {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Stages of the request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    /// Request accepted and identifier assigned.
    Received,
    /// Input validated and materialised.
    Resolving,
    /// External processor running.
    Processing,
    /// Outputs being bundled into the archive.
    Packaging,
    /// Terminal success.
    Succeeded,
    /// Terminal failure.
    Failed,
}

impl LifecycleStage {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Resolving => "resolving",
            Self::Processing => "processing",
            Self::Packaging => "packaging",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// A single unit of work and the filesystem locations it owns.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Unique identifier scoping the request and its workspace.
    pub id: Uuid,
    /// Resolved local input image.
    pub input_path: PathBuf,
    /// Directory exclusively owned by this request.
    pub output_dir: PathBuf,
    /// Whether the input was uploaded or referenced.
    pub origin: InputOrigin,
    /// Current status.
    pub status: RequestStatus,
}

impl ImageRequest {
    /// Build a pending request.
    #[must_use]
    pub const fn new(
        id: Uuid,
        input_path: PathBuf,
        output_dir: PathBuf,
        origin: InputOrigin,
    ) -> Self {
        Self {
            id,
            input_path,
            output_dir,
            origin,
            status: RequestStatus::Pending,
        }
    }
}

/// Ordered mapping from semantic artifact name to file name inside the workspace.
///
/// Order follows insertion and is preserved through JSON, so archive members
/// are written deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputFileSet {
    entries: IndexMap<String, String>,
}

impl OutputFileSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an artifact. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, file_name: impl Into<String>) {
        self.entries.insert(name.into(), file_name.into());
    }

    /// Look up the file name for an artifact.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Iterate `(name, file_name)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, file)| (name.as_str(), file.as_str()))
    }

    /// Iterate file names in order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Number of declared artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no artifacts were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for OutputFileSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, file)| (name.into(), file.into()))
                .collect(),
        }
    }
}

/// Result of a request that completed every stage.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedRequest {
    /// Identifier of the request.
    pub request_id: Uuid,
    /// Artifacts declared by the processor.
    pub output_files: OutputFileSet,
    /// Archive location relative to the output root (`<id>/<archive>`).
    pub archive_reference: String,
    /// Public URL under which the workspace files are served.
    pub base_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_file_set_preserves_insertion_order() -> anyhow::Result<()> {
        let mut set = OutputFileSet::new();
        set.insert("mesh", "cat_mesh.glb");
        set.insert("texture", "cat_texture.png");
        set.insert("mesh", "cat_mesh_v2.glb");

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("mesh"), Some("cat_mesh_v2.glb"));
        assert_eq!(
            set.file_names().collect::<Vec<_>>(),
            vec!["cat_mesh_v2.glb", "cat_texture.png"]
        );

        let json = serde_json::to_string(&set)?;
        assert_eq!(
            json,
            r#"{"mesh":"cat_mesh_v2.glb","texture":"cat_texture.png"}"#
        );
        Ok(())
    }

    #[test]
    fn output_file_set_parses_json_objects_in_order() -> anyhow::Result<()> {
        let set: OutputFileSet =
            serde_json::from_str(r#"{"video":"a.mp4","mesh":"a.glb","gaussian":"a.ply"}"#)?;
        let names: Vec<_> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["video", "mesh", "gaussian"]);
        assert!(serde_json::from_str::<OutputFileSet>(r#"["a.glb"]"#).is_err());
        Ok(())
    }

    #[test]
    fn input_origin_marks_uploads_transient() {
        assert!(InputOrigin::Uploaded.is_transient());
        assert!(!InputOrigin::Referenced.is_transient());
    }

    #[test]
    fn lifecycle_stage_labels_are_stable() {
        assert_eq!(LifecycleStage::Packaging.as_str(), "packaging");
        assert_eq!(LifecycleStage::Failed.as_str(), "failed");
        assert_eq!(RequestStatus::Success.as_str(), "success");
    }
}
