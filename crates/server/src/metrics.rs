//! Prometheus metrics for the Assay server.
//!
//! Counters cover intake traffic, lifecycle updates and failed requests.
//! Labels never carry client or report identifiers, only field group names
//! and error codes.
//!
//! The `/metrics` endpoint is unauthenticated and should be reachable by the
//! Prometheus scraper only.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Intake metrics
pub static INTAKES_SUBMITTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "assay_intakes_submitted_total",
        "Total number of client intake submissions committed",
    )
    .expect("metric creation failed")
});

pub static PROJECTS_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "assay_projects_created_total",
        "Total number of projects created by lab staff",
    )
    .expect("metric creation failed")
});

pub static SAMPLES_RECORDED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "assay_samples_recorded_total",
        "Total number of sample rows recorded",
    )
    .expect("metric creation failed")
});

pub static INTAKE_SUBMIT_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "assay_intake_submit_duration_seconds",
            "Time taken to commit an intake submission",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
    )
    .expect("metric creation failed")
});

// Lifecycle metrics
pub static LIFECYCLE_UPDATES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "assay_lifecycle_updates_total",
            "Total analysis metadata updates by field group",
        ),
        &["group"],
    )
    .expect("metric creation failed")
});

// Error metrics
pub static REQUEST_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "assay_request_errors_total",
            "Total failed API requests by error code",
        ),
        &["code"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(INTAKES_SUBMITTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PROJECTS_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SAMPLES_RECORDED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(INTAKE_SUBMIT_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(LIFECYCLE_UPDATES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(REQUEST_ERRORS.clone()))
            .expect("metric registration failed");
    });
}

/// Handler for the /metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record one lifecycle update for the given field group.
pub fn record_lifecycle_update(group: &str) {
    LIFECYCLE_UPDATES.with_label_values(&[group]).inc();
}

/// Record a failed request by its API error code.
pub fn record_request_error(code: &str) {
    REQUEST_ERRORS.with_label_values(&[code]).inc();
}
