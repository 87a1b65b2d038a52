//! Prometheus metrics for albumstore.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`,
//! defines metric name constants, provides a middleware for HTTP RED
//! metrics, and exposes the `/metrics` endpoint handler.

use anyhow::Context;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

// -- Metric name constants ----------------------------------------------------

/// Total HTTP requests (counter). Labels: method, path, status.
pub const HTTP_REQUESTS_TOTAL: &str = "albumstore_http_requests_total";

/// HTTP request duration in seconds (histogram). Labels: method, path.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "albumstore_http_request_duration_seconds";

/// Albums materialized by catalog builds (counter).
pub const ALBUMS_BUILT_TOTAL: &str = "albumstore_albums_built_total";

/// Prefixes dropped because their build failed (counter).
pub const ALBUMS_SKIPPED_TOTAL: &str = "albumstore_albums_skipped_total";

/// Management actions (counter). Labels: action, status.
pub const MANAGE_ACTIONS_TOTAL: &str = "albumstore_manage_actions_total";

// -- Global recorder installation ---------------------------------------------

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder.  Calling it again returns the
/// handle installed the first time.
pub fn init_metrics() -> anyhow::Result<&'static PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Register metric descriptions with the global recorder. Call once after
/// `init_metrics()`.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(ALBUMS_BUILT_TOTAL, "Albums returned by catalog builds");
    describe_counter!(
        ALBUMS_SKIPPED_TOTAL,
        "Album prefixes skipped after a storage failure"
    );
    describe_counter!(MANAGE_ACTIONS_TOTAL, "Management actions by outcome");
}

/// Count one management action outcome.
pub fn record_manage_action(action: &'static str, status: &'static str) {
    counter!(MANAGE_ACTIONS_TOTAL, "action" => action, "status" => status).increment(1);
}

// -- Metrics middleware -------------------------------------------------------

/// Axum middleware that records HTTP RED metrics for every request.
///
/// Excludes `/metrics` from self-instrumentation to avoid feedback loops.
pub async fn metrics_middleware(
    req: Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    if req.uri().path() == "/metrics" {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path, "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

// -- Path normalization -------------------------------------------------------

/// Map a request path to a bounded label value.
///
/// Known routes keep their path; anything else collapses to `/{other}` so
/// requests for random paths cannot blow up label cardinality.
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/openapi.json" => "/openapi.json",
        "/api/s3/albums" => "/api/s3/albums",
        "/api/s3/manage" => "/api/s3/manage",
        _ => "/{other}",
    }
}

// -- Metrics endpoint handler -------------------------------------------------

/// `GET /metrics` -- Render Prometheus exposition format text.
///
/// Renders an empty document when no recorder has been installed.
pub async fn metrics_handler() -> impl IntoResponse {
    let body = PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        body,
    )
}

// -- Tests --------------------------------------------------------------------
