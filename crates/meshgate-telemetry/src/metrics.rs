//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Each service instance owns its registry so tests never share counters.

use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Terminal classification of a processing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// Artifacts were generated and packaged.
    Success,
    /// The caller supplied unusable input.
    Rejected,
    /// Processing or packaging failed on the server side.
    Failed,
}

impl LifecycleOutcome {
    /// Label value used in the `outcome` dimension.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    lifecycle_requests_total: IntCounterVec,
    lifecycle_stage_total: IntCounterVec,
    transient_cleanup_failures_total: IntCounter,
    processing_latency_ms: IntGauge,
    in_flight_requests: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Requests currently between receipt and finalization.
    pub in_flight_requests: i64,
    /// Duration of the most recent processor invocation.
    pub processing_latency_ms: i64,
    /// Uploaded inputs that could not be removed.
    pub transient_cleanup_failures_total: u64,
}

/// Decrements the in-flight gauge when dropped.
#[must_use = "the request stops counting as in flight once the guard is dropped"]
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests handled",
            &["route", "code"],
        )?;
        let lifecycle_requests_total = counter_vec(
            "lifecycle_requests_total",
            "Processing requests finished by outcome",
            &["outcome"],
        )?;
        let lifecycle_stage_total = counter_vec(
            "lifecycle_stage_total",
            "Lifecycle stages executed by status",
            &["stage", "status"],
        )?;
        let transient_cleanup_failures_total = IntCounter::with_opts(Opts::new(
            "transient_cleanup_failures_total",
            "Uploaded inputs that could not be removed after processing",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "transient_cleanup_failures_total",
            source,
        })?;
        let processing_latency_ms = gauge(
            "processing_latency_ms",
            "Duration of the most recent processor invocation (ms)",
        )?;
        let in_flight_requests = gauge(
            "in_flight_requests",
            "Processing requests currently in flight",
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(
            &registry,
            "lifecycle_requests_total",
            &lifecycle_requests_total,
        )?;
        register(&registry, "lifecycle_stage_total", &lifecycle_stage_total)?;
        register(
            &registry,
            "transient_cleanup_failures_total",
            &transient_cleanup_failures_total,
        )?;
        register(&registry, "processing_latency_ms", &processing_latency_ms)?;
        register(&registry, "in_flight_requests", &in_flight_requests)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                lifecycle_requests_total,
                lifecycle_stage_total,
                transient_cleanup_failures_total,
                processing_latency_ms,
                in_flight_requests,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Count a finished processing request.
    pub fn inc_lifecycle_request(&self, outcome: LifecycleOutcome) {
        self.inner
            .lifecycle_requests_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Count a lifecycle stage by status (`completed` or `failed`).
    pub fn inc_lifecycle_stage(&self, stage: &str, status: &str) {
        self.inner
            .lifecycle_stage_total
            .with_label_values(&[stage, status])
            .inc();
    }

    /// Count an uploaded input that could not be removed.
    pub fn inc_transient_cleanup_failure(&self) {
        self.inner.transient_cleanup_failures_total.inc();
    }

    /// Record how long the processor took for the latest request.
    pub fn observe_processing_latency(&self, duration: Duration) {
        self.inner
            .processing_latency_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Mark a request as in flight until the returned guard is dropped.
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.inner.in_flight_requests.inc();
        InFlightGuard {
            gauge: self.inner.in_flight_requests.clone(),
        }
    }

    /// Current number of in-flight processing requests.
    #[must_use]
    pub fn in_flight(&self) -> i64 {
        self.inner.in_flight_requests.get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight_requests: self.inner.in_flight_requests.get(),
            processing_latency_ms: self.inner.processing_latency_ms.get(),
            transient_cleanup_failures_total: self.inner.transient_cleanup_failures_total.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
