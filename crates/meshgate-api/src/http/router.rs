//! Router construction and server startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::{get, post},
};
use meshgate_core::ImageWorkflow;
use meshgate_telemetry::{Metrics, http_request_span, record_response};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::health::{health, metrics};
use crate::http::initialize::initialize;
use crate::http::output::serve_output;
use crate::http::process::process;
use crate::http::tracking::track_request;
use crate::state::{ApiSettings, ApiState};

/// Axum router wrapper that hosts the Meshgate HTTP API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct a new API server around a request workflow.
    #[must_use]
    pub fn new(
        workflow: Arc<dyn ImageWorkflow>,
        telemetry: Metrics,
        settings: ApiSettings,
    ) -> Self {
        let state = Arc::new(ApiState::new(workflow, telemetry, settings.output_root));
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                http_request_span(request.method().as_str(), request.uri().path())
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    record_response(span, response.status().as_u16(), latency);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(meshgate_telemetry::propagate_request_id_layer())
            .layer(meshgate_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(middleware::from_fn_with_state(Arc::clone(&state), track_request));

        let router = Self::routes()
            .layer(DefaultBodyLimit::max(settings.max_upload_bytes))
            .layer(CorsLayer::permissive())
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/process", post(process))
            .route("/initialize", post(initialize))
            .route("/output/{request_id}/{filename}", get(serve_output))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
    }

    /// Consume the server and return the underlying router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind `addr` and serve until the process receives Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "starting api listener");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
