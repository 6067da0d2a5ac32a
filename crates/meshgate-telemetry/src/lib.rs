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

//! Telemetry primitives shared across the Meshgate workspace.
//!
//! Layout: `init.rs` (subscriber setup), `spans.rs` (service and request
//! spans), `layers.rs` (request-id middleware), `metrics.rs` (Prometheus
//! registry), `error.rs` (error types).

pub mod error;
pub mod init;
pub mod layers;
pub mod metrics;
pub mod spans;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
pub use metrics::{InFlightGuard, LifecycleOutcome, Metrics, MetricsSnapshot};
pub use spans::{http_request_span, record_response, record_route, service_span};
