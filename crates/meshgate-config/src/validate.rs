//! Validation helpers and parsing utilities for configuration values.

use std::net::IpAddr;
use std::path::{Component, Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{CommandSpec, LogFormatChoice};

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_port(field: &'static str, value: &str) -> ConfigResult<u16> {
    let port = value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::invalid(field, value, "not_a_port"))?;
    if port == 0 {
        return Err(ConfigError::invalid(field, value, "zero"));
    }
    Ok(port)
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_bind_addr(field: &'static str, value: &str) -> ConfigResult<IpAddr> {
    let Some(host) = value.trim().split('/').next() else {
        return Err(ConfigError::invalid(field, value, "empty"));
    };
    host.parse::<IpAddr>()
        .map_err(|_| ConfigError::invalid(field, value, "not_an_ip"))
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_positive(field: &'static str, value: &str) -> ConfigResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::invalid(field, value, "zero")),
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::invalid(field, value, "not_an_integer")),
    }
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_root(field: &'static str, value: &str) -> ConfigResult<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, value, "empty"));
    }
    Ok(PathBuf::from(trimmed))
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_archive_name(field: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    let mut components = Path::new(trimmed).components();
    let single_component = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_component {
        return Err(ConfigError::invalid(field, value, "not_a_file_name"));
    }
    if !trimmed.to_ascii_lowercase().ends_with(".zip") {
        return Err(ConfigError::invalid(field, value, "missing_zip_extension"));
    }
    Ok(trimmed.to_string())
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_base_url(field: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let has_host = trimmed
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.is_empty());
    if !has_scheme || !has_host {
        return Err(ConfigError::invalid(field, value, "not_an_http_url"));
    }
    Ok(trimmed.to_string())
}

/// Split a command line on whitespace.
///
/// No shell quoting is interpreted: quotes stay part of the word and a path
/// containing spaces becomes several arguments. Commands that need either
/// should point at a wrapper script.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_command(field: &'static str, value: &str) -> ConfigResult<CommandSpec> {
    let mut parts = value.split_whitespace().map(str::to_string);
    let Some(program) = parts.next() else {
        return Err(ConfigError::invalid(field, value, "empty"));
    };
    Ok(CommandSpec {
        program,
        args: parts.collect(),
    })
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_log_format(field: &'static str, value: &str) -> ConfigResult<LogFormatChoice> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormatChoice::Json),
        "pretty" | "text" => Ok(LogFormatChoice::Pretty),
        _ => Err(ConfigError::invalid(field, value, "unknown_format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_port_accepts_valid_range() -> ConfigResult<()> {
        assert_eq!(parse_port("port", "8080")?, 8080);
        assert_eq!(parse_port("port", " 5000 ")?, 5000);
        Ok(())
    }

    #[test]
    fn parse_port_rejects_zero_and_non_numeric() {
        assert!(matches!(
            parse_port("port", "0"),
            Err(ConfigError::InvalidField { reason: "zero", .. })
        ));
        assert!(matches!(
            parse_port("port", "70000"),
            Err(ConfigError::InvalidField {
                reason: "not_a_port",
                ..
            })
        ));
    }

    #[test]
    fn parse_bind_addr_accepts_cidr_suffix() -> ConfigResult<()> {
        assert_eq!(
            parse_bind_addr("bind", "127.0.0.1/32")?,
            IpAddr::from([127, 0, 0, 1])
        );
        assert!(parse_bind_addr("bind", "localhost").is_err());
        Ok(())
    }

    #[test]
    fn parse_archive_name_requires_plain_zip_file() -> ConfigResult<()> {
        assert_eq!(parse_archive_name("archive", "outputs.zip")?, "outputs.zip");
        assert!(parse_archive_name("archive", "../outputs.zip").is_err());
        assert!(parse_archive_name("archive", "nested/outputs.zip").is_err());
        assert!(parse_archive_name("archive", "outputs.tar").is_err());
        assert!(parse_archive_name("archive", "").is_err());
        Ok(())
    }

    #[test]
    fn parse_base_url_trims_trailing_slash() -> ConfigResult<()> {
        assert_eq!(
            parse_base_url("url", "https://meshes.example.com/")?,
            "https://meshes.example.com"
        );
        assert!(parse_base_url("url", "ftp://host").is_err());
        assert!(parse_base_url("url", "http://").is_err());
        Ok(())
    }

    #[test]
    fn parse_command_splits_program_and_args() -> ConfigResult<()> {
        let spec = parse_command("cmd", "python3  run.py --fast")?;
        assert_eq!(spec.program, "python3");
        assert_eq!(spec.args, vec!["run.py", "--fast"]);
        assert!(parse_command("cmd", "   ").is_err());
        Ok(())
    }

    #[test]
    fn parse_command_does_not_interpret_quotes() -> ConfigResult<()> {
        let spec = parse_command("cmd", r#"run.sh "/srv/my models""#)?;
        assert_eq!(spec.program, "run.sh");
        assert_eq!(spec.args, vec![r#""/srv/my"#, r#"models""#]);
        Ok(())
    }

    #[test]
    fn parse_helpers_reject_degenerate_values() {
        assert!(parse_positive("limit", "0").is_err());
        assert!(parse_positive("limit", "-5").is_err());
        assert!(parse_root("root", "  ").is_err());
        assert!(parse_log_format("format", "xml").is_err());
        assert!(matches!(
            parse_log_format("format", "JSON"),
            Ok(LogFormatChoice::Json)
        ));
    }
}
