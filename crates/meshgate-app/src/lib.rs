#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Meshgate application wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `orchestrator.rs` (request
//! lifecycle), `processor.rs` (external inference command).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level error types.
pub mod error;
/// Request lifecycle controller.
pub mod orchestrator;
/// Command-backed image processor.
pub mod processor;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
pub use orchestrator::RequestOrchestrator;
pub use processor::CommandProcessor;
