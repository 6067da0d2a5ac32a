//! Per-request bookkeeping: route and request id on the span, counters on the way out.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use meshgate_telemetry::record_route;
use tracing::Span;

use crate::http::constants::HEADER_REQUEST_ID;
use crate::state::ApiState;

/// Counts requests per matched route and status.
///
/// Runs inside the `http.request` span, so the route and request id it
/// records there reach the `lifecycle` span of any work the handler starts.
pub(crate) async fn track_request(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_string(),
        |matched| matched.as_str().to_string(),
    );
    let request_id = request
        .headers()
        .get(HEADER_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    record_route(&Span::current(), &route, request_id);

    let response = next.run(request).await;
    state
        .telemetry
        .inc_http_request(&route, response.status().as_u16());
    response
}
