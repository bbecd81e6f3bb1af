//! Prometheus metrics for the dispatcher transport boundary.
//!
//! The middleware chain itself never records anything; these metrics are
//! emitted by the [`Dispatcher`](crate::pipeline::Dispatcher) service and at
//! startup.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `helmet_requests_total` - Dispatched requests (label: status)
//! - `helmet_pipeline_errors_total` - Failed pipelines (label: kind)
//!
//! ## Histograms
//! - `helmet_request_duration_seconds` - Time spent in the pipeline
//!
//! ## Gauges
//! - `helmet_active_rules` - Number of header rules in the configured rule set
//!
//! # Usage
//!
//! ```rust,ignore
//! use helmet_pipeline::metrics::{init_metrics, set_active_rules};
//!
//! init_metrics("0.0.0.0:9090".parse()?)?;
//! set_active_rules(helmet.rules().len());
//! ```

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "helmet_requests_total";
    pub const PIPELINE_ERRORS_TOTAL: &str = "helmet_pipeline_errors_total";
    pub const REQUEST_DURATION_SECONDS: &str = "helmet_request_duration_seconds";
    pub const ACTIVE_RULES: &str = "helmet_active_rules";
}

/// Initialize the Prometheus metrics exporter.
///
/// Sets up metric descriptions and starts the Prometheus HTTP listener on
/// `metrics_addr`.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(names::REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_counter!(
        names::PIPELINE_ERRORS_TOTAL,
        "Total number of pipelines that ended in an error"
    );
    describe_histogram!(
        names::REQUEST_DURATION_SECONDS,
        "Time spent running a request through the middleware pipeline"
    );
    describe_gauge!(
        names::ACTIVE_RULES,
        "Number of security header rules in the active rule set"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record one dispatched request and its pipeline duration.
pub fn record_request(status: &str, duration_secs: f64) {
    counter!(names::REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
    histogram!(names::REQUEST_DURATION_SECONDS).record(duration_secs);
}

/// Record a pipeline that resolved to an error.
pub fn record_pipeline_error(kind: &'static str) {
    counter!(names::PIPELINE_ERRORS_TOTAL, "kind" => kind).increment(1);
}

/// Publish the size of the resolved rule set.
pub fn set_active_rules(count: usize) {
    gauge!(names::ACTIVE_RULES).set(count as f64);
}
