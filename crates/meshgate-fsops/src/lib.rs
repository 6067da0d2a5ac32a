#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem side of the request lifecycle: per-request workspaces, input
//! staging, archive packaging, and transient cleanup.
//!
//! All functions here block; async callers run them on the blocking pool.

pub mod archive;
pub mod cleanup;
pub mod error;
pub mod input;
pub mod service;
pub mod workspace;

pub use cleanup::CleanupOutcome;
pub use error::{FsOpsError, FsOpsResult};
pub use input::{ResolvedInput, accept_source, validate_source};
pub use service::FsOpsService;
pub use workspace::Workspace;
