//! Fallback values applied when an environment variable is unset.
//!
//! # Design
//! - Match the storage layout of a stock TRELLIS deployment.
//! - Keep limits explicit for auditability.

pub(crate) const INPUT_ROOT: &str = "/workspace/TRELLIS/input";
pub(crate) const OUTPUT_ROOT: &str = "/workspace/TRELLIS/output";
pub(crate) const ARCHIVE_NAME: &str = "outputs.zip";
pub(crate) const BIND_ADDR: &str = "0.0.0.0";
pub(crate) const HTTP_PORT: u16 = 5000;
/// 64 MiB.
pub(crate) const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
pub(crate) const LOG_LEVEL: &str = "info";
