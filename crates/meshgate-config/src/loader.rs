//! Environment-backed configuration loader.
//!
//! # Design
//! - Read every value through a lookup closure so tests never touch the process environment.
//! - Validate eagerly; a partially valid configuration never reaches the service.

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{HttpConfig, LoggingSettings, ProcessorConfig, ServiceConfig, StorageConfig};
use crate::validate::{
    parse_archive_name, parse_base_url, parse_bind_addr, parse_command, parse_log_format,
    parse_port, parse_positive, parse_root,
};

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "MESHGATE_";

const INPUT_ROOT: &str = "MESHGATE_INPUT_ROOT";
const OUTPUT_ROOT: &str = "MESHGATE_OUTPUT_ROOT";
const ARCHIVE_NAME: &str = "MESHGATE_ARCHIVE_NAME";
const BIND_ADDR: &str = "MESHGATE_BIND_ADDR";
const HTTP_PORT: &str = "MESHGATE_HTTP_PORT";
const PUBLIC_BASE_URL: &str = "MESHGATE_PUBLIC_BASE_URL";
const MAX_UPLOAD_BYTES: &str = "MESHGATE_MAX_UPLOAD_BYTES";
const PROCESS_COMMAND: &str = "MESHGATE_PROCESS_COMMAND";
const INIT_COMMAND: &str = "MESHGATE_INIT_COMMAND";
const LOG_LEVEL: &str = "MESHGATE_LOG_LEVEL";
const LOG_FORMAT: &str = "MESHGATE_LOG_FORMAT";

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value fails validation.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let storage = StorageConfig {
            input_root: parse_root(
                INPUT_ROOT,
                get(INPUT_ROOT).as_deref().unwrap_or(defaults::INPUT_ROOT),
            )?,
            output_root: parse_root(
                OUTPUT_ROOT,
                get(OUTPUT_ROOT).as_deref().unwrap_or(defaults::OUTPUT_ROOT),
            )?,
            archive_name: parse_archive_name(
                ARCHIVE_NAME,
                get(ARCHIVE_NAME).as_deref().unwrap_or(defaults::ARCHIVE_NAME),
            )?,
        };
        if storage.input_root == storage.output_root {
            return Err(ConfigError::InvalidField {
                field: OUTPUT_ROOT,
                value: Some(storage.output_root.display().to_string()),
                reason: "same_as_input_root",
            });
        }

        let port = get(HTTP_PORT)
            .map(|value| parse_port(HTTP_PORT, &value))
            .transpose()?
            .unwrap_or(defaults::HTTP_PORT);
        let public_base_url = match get(PUBLIC_BASE_URL) {
            Some(value) => parse_base_url(PUBLIC_BASE_URL, &value)?,
            None => format!("http://localhost:{port}"),
        };
        let http = HttpConfig {
            bind_addr: parse_bind_addr(
                BIND_ADDR,
                get(BIND_ADDR).as_deref().unwrap_or(defaults::BIND_ADDR),
            )?,
            port,
            public_base_url,
            max_upload_bytes: get(MAX_UPLOAD_BYTES)
                .map(|value| parse_positive(MAX_UPLOAD_BYTES, &value))
                .transpose()?
                .unwrap_or(defaults::MAX_UPLOAD_BYTES),
        };

        let process_command = get(PROCESS_COMMAND).ok_or(ConfigError::MissingField {
            name: PROCESS_COMMAND,
        })?;
        let processor = ProcessorConfig {
            process_command: parse_command(PROCESS_COMMAND, &process_command)?,
            init_command: get(INIT_COMMAND)
                .map(|value| parse_command(INIT_COMMAND, &value))
                .transpose()?,
        };

        let logging = LoggingSettings {
            level: get(LOG_LEVEL).unwrap_or_else(|| defaults::LOG_LEVEL.to_string()),
            format: get(LOG_FORMAT)
                .map(|value| parse_log_format(LOG_FORMAT, &value))
                .transpose()?,
        };

        let config = Self {
            storage,
            http,
            processor,
            logging,
        };
        debug!(
            input_root = %config.storage.input_root.display(),
            output_root = %config.storage.output_root.display(),
            port = config.http.port,
            "configuration loaded"
        );
        Ok(config)
    }
}
