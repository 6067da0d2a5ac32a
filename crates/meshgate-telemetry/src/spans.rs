//! Span constructors shared by the binary and the HTTP layer.
//!
//! Request fields live on spans rather than in task-local storage: work the
//! API triggers (including spawned lifecycle tasks) opens its spans as
//! children of `http.request`, so every event carries the route and request id.

use std::time::Duration;

use tracing::{Span, field::Empty, info_span};

use crate::init::build_sha;

/// Root span for the whole service; `mode` can be updated as startup progresses.
#[must_use]
pub fn service_span(mode: &str) -> Span {
    info_span!("meshgate", mode, build_sha = %build_sha())
}

/// Span for one inbound HTTP request.
///
/// `route` and `request_id` are filled in by [`record_route`] once routing has
/// matched; `status_code` and `latency_ms` by [`record_response`].
#[must_use]
pub fn http_request_span(method: &str, path: &str) -> Span {
    info_span!(
        "http.request",
        method,
        path,
        build_sha = %build_sha(),
        route = Empty,
        request_id = Empty,
        status_code = Empty,
        latency_ms = Empty
    )
}

/// Record the matched route and `x-request-id` on an `http.request` span.
pub fn record_route(span: &Span, route: &str, request_id: &str) {
    span.record("route", route);
    span.record("request_id", request_id);
}

/// Record the response status and latency on an `http.request` span.
pub fn record_response(span: &Span, status: u16, latency: Duration) {
    span.record("status_code", status);
    span.record(
        "latency_ms",
        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
    );
}
