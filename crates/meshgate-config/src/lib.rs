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

//! Environment-driven service configuration.
//!
//! Layout: `model.rs` (typed configuration sections), `loader.rs` (environment
//! lookup), `validate.rs` (parsing helpers), `defaults.rs` (fallback values).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ENV_PREFIX;
pub use model::{
    CommandSpec, HttpConfig, LogFormatChoice, LoggingSettings, ProcessorConfig, ServiceConfig,
    StorageConfig,
};
