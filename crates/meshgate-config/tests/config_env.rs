use std::collections::HashMap;
use std::net::IpAddr;

use meshgate_config::{ConfigError, LogFormatChoice, ServiceConfig};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn full_environment_round_trips_into_config() -> anyhow::Result<()> {
    let config = ServiceConfig::from_lookup(env(&[
        ("MESHGATE_INPUT_ROOT", "/data/in"),
        ("MESHGATE_OUTPUT_ROOT", "/data/out"),
        ("MESHGATE_ARCHIVE_NAME", "bundle.zip"),
        ("MESHGATE_BIND_ADDR", "127.0.0.1"),
        ("MESHGATE_HTTP_PORT", "7000"),
        ("MESHGATE_PUBLIC_BASE_URL", "https://meshes.example.com/"),
        ("MESHGATE_MAX_UPLOAD_BYTES", "1048576"),
        ("MESHGATE_PROCESS_COMMAND", "python3 /opt/trellis/run.py --seed 1"),
        ("MESHGATE_INIT_COMMAND", "python3 /opt/trellis/warm.py"),
        ("MESHGATE_LOG_LEVEL", "debug"),
        ("MESHGATE_LOG_FORMAT", "json"),
    ]))?;

    assert_eq!(config.storage.archive_name, "bundle.zip");
    assert_eq!(config.http.bind_addr, IpAddr::from([127, 0, 0, 1]));
    assert_eq!(config.http.socket_addr().port(), 7000);
    assert_eq!(config.http.public_base_url, "https://meshes.example.com");
    assert_eq!(config.http.max_upload_bytes, 1_048_576);
    assert_eq!(
        config.processor.process_command.args,
        vec!["/opt/trellis/run.py", "--seed", "1"]
    );
    assert_eq!(
        config
            .processor
            .init_command
            .as_ref()
            .map(|command| command.program.as_str()),
        Some("python3")
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, Some(LogFormatChoice::Json));

    let rendered = serde_json::to_value(&config)?;
    assert_eq!(rendered["storage"]["input_root"], "/data/in");
    assert_eq!(rendered["logging"]["format"], "json");
    Ok(())
}

#[test]
fn invalid_port_is_rejected_with_field_name() {
    let result = ServiceConfig::from_lookup(env(&[
        ("MESHGATE_PROCESS_COMMAND", "run"),
        ("MESHGATE_HTTP_PORT", "http"),
    ]));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidField {
            field: "MESHGATE_HTTP_PORT",
            reason: "not_a_port",
            ..
        })
    ));
}

#[test]
fn archive_name_with_separator_is_rejected() {
    let result = ServiceConfig::from_lookup(env(&[
        ("MESHGATE_PROCESS_COMMAND", "run"),
        ("MESHGATE_ARCHIVE_NAME", "../escape.zip"),
    ]));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidField {
            field: "MESHGATE_ARCHIVE_NAME",
            ..
        })
    ));
}
