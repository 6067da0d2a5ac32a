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
#![allow(clippy::module_name_repetitions, clippy::redundant_pub_crate)]

//! HTTP delivery surface for Meshgate.
//!
//! Layout: `http/router.rs` (server and middleware), `http/process.rs`
//! (request submission), `http/output.rs` (artifact download),
//! `http/health.rs` (health and metrics), `models.rs` (response bodies).

pub mod error;
pub mod http;
pub mod models;
mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::ApiSettings;
