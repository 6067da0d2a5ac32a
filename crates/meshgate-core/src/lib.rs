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

//! Engine-agnostic request lifecycle types and collaborator contracts.
//!
//! Layout: `model/` (request, input and output DTOs), `service/` (processor and
//! workflow traits), `error.rs` (input, processor and workflow errors).

pub mod error;
pub mod model;
pub mod service;

pub use error::{FailureClass, InputError, ProcessorError, WorkflowError, WorkflowResult};
pub use model::{
    ImageRequest, ImageSource, InputOrigin, LifecycleStage, OutputFileSet, ProcessedRequest,
    RequestStatus,
};
pub use service::{ImageProcessor, ImageWorkflow};
