//! Typed configuration sections.
//!
//! # Design
//! - Pure data carriers; parsing lives in `loader.rs` and `validate.rs`.
//! - Storage roots are explicit values so tests can point them at temporary directories.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::Serialize;

/// Complete service configuration assembled at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    /// Filesystem roots and archive naming.
    pub storage: StorageConfig,
    /// HTTP listener settings.
    pub http: HttpConfig,
    /// External processor commands.
    pub processor: ProcessorConfig,
    /// Logging preferences.
    pub logging: LoggingSettings,
}

/// Filesystem namespaces shared by all requests.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Staging area for transient uploads.
    pub input_root: PathBuf,
    /// Parent of every per-request workspace.
    pub output_root: PathBuf,
    /// File name of the per-request archive.
    pub archive_name: String,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HttpConfig {
    /// Interface to bind.
    pub bind_addr: IpAddr,
    /// TCP port to bind.
    pub port: u16,
    /// Externally visible origin used to build `base_url` links, without trailing slash.
    pub public_base_url: String,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
}

impl HttpConfig {
    /// Socket address the listener binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Program plus arguments, split on whitespace without shell quoting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable to run.
    pub program: String,
    /// Arguments passed before any request-specific arguments.
    pub args: Vec<String>,
}

/// Commands backing the external processor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Command run once per request with `<input_path> <output_dir>` appended.
    pub process_command: CommandSpec,
    /// Optional command run by `/initialize`.
    pub init_command: Option<CommandSpec>,
}

/// Requested log output format.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatChoice {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging preferences.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Explicit format; `None` lets the telemetry crate infer one from the build.
    pub format: Option<LogFormatChoice>,
}
