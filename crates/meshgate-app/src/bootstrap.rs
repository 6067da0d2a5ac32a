use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::orchestrator::RequestOrchestrator;
use crate::processor::CommandProcessor;
use meshgate_api::{ApiServer, ApiSettings};
use meshgate_config::{LogFormatChoice, LoggingSettings, ServiceConfig};
use meshgate_core::ImageProcessor;
use meshgate_fsops::FsOpsService;
use meshgate_telemetry::{LogFormat, LoggingConfig, Metrics, service_span};
use tracing::{Instrument, info};

/// Build identifier stamped on logs and `/health`; set at compile time when available.
const BUILD_SHA: &str = match option_env!("MESHGATE_BUILD_SHA") {
    Some(sha) => sha,
    None => env!("CARGO_PKG_VERSION"),
};

/// Dependencies required to bootstrap the Meshgate service.
pub(crate) struct BootstrapDependencies {
    config: ServiceConfig,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            ServiceConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self { config, telemetry })
    }
}

/// Entry point for the Meshgate boot sequence.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the storage roots cannot be
/// created, or the listener cannot bind.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies { config, telemetry } = dependencies;

    meshgate_telemetry::init_logging(&logging_config(&config.logging))
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let span = service_span("bootstrap");

    async {
        info!("Meshgate bootstrap starting");

        let api = build_api(&config, telemetry)?;
        let addr = config.http.socket_addr();
        tracing::Span::current().record("mode", "serving");
        info!(
            addr = %addr,
            public_base_url = %config.http.public_base_url,
            "Launching API listener"
        );

        api.serve(addr)
            .await
            .map_err(|err| AppError::api_server("api_server.serve", err))?;
        info!("API server shutdown complete");
        Ok(())
    }
    .instrument(span)
    .await
}

/// Wire storage, processor, and orchestrator into an API server.
pub(crate) fn build_api(config: &ServiceConfig, telemetry: Metrics) -> AppResult<ApiServer> {
    let fsops = FsOpsService::new(
        config.storage.input_root.clone(),
        config.storage.output_root.clone(),
        config.storage.archive_name.clone(),
        telemetry.clone(),
    );
    fsops
        .ensure_roots()
        .map_err(|err| AppError::fsops("fsops.ensure_roots", err))?;
    info!(
        input_root = %config.storage.input_root.display(),
        output_root = %config.storage.output_root.display(),
        "Storage roots ready"
    );

    let processor: Arc<dyn ImageProcessor> = Arc::new(CommandProcessor::new(&config.processor));
    let orchestrator = RequestOrchestrator::new(
        processor,
        fsops,
        telemetry.clone(),
        config.http.public_base_url.clone(),
    );

    Ok(ApiServer::new(
        Arc::new(orchestrator),
        telemetry,
        ApiSettings {
            output_root: config.storage.output_root.clone(),
            max_upload_bytes: config.http.max_upload_bytes,
        },
    ))
}

fn logging_config(settings: &LoggingSettings) -> LoggingConfig<'_> {
    let format = settings.format.map_or_else(LogFormat::infer, |choice| match choice {
        LogFormatChoice::Json => LogFormat::Json,
        LogFormatChoice::Pretty => LogFormat::Pretty,
    });
    LoggingConfig {
        level: &settings.level,
        format,
        build_sha: BUILD_SHA,
    }
}
