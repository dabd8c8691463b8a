//! Metrics and observability utilities
//!
//! Prometheus-style metrics with standardized naming conventions.
//! Recording is a no-op until a recorder is installed (the gateway
//! installs the Prometheus exporter at startup).

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all SiteChat metrics
pub const METRICS_PREFIX: &str = "sitechat";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
];

/// Buckets for engine construction (fetch + parse + index)
pub const BUILD_BUCKETS: &[f64] = &[0.050, 0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.00, 30.00];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of knowledge search queries"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Knowledge search latency in seconds"
    );

    describe_counter!(
        format!("{}_engine_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Search engine construction attempts"
    );

    describe_histogram!(
        format!("{}_engine_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search engine construction latency in seconds"
    );

    describe_gauge!(
        format!("{}_index_terms", METRICS_PREFIX),
        Unit::Count,
        "Distinct terms in the search index"
    );

    describe_counter!(
        format!("{}_chat_replies_total", METRICS_PREFIX),
        Unit::Count,
        "Chat replies by responder tier"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record search metrics. `outcome` is one of `hit`, `miss`, `not_ready`.
pub fn record_search(duration_secs: f64, outcome: &str) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(format!("{}_search_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record a finished engine construction
pub fn record_engine_build(duration_secs: f64, success: bool, term_count: usize) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_engine_builds_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(format!("{}_engine_build_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    if success {
        gauge!(format!("{}_index_terms", METRICS_PREFIX)).set(term_count as f64);
    }
}

/// Helper to record which responder tier produced a chat reply
pub fn record_chat_reply(tier: &str) {
    counter!(
        format!("{}_chat_replies_total", METRICS_PREFIX),
        "tier" => tier.to_string()
    )
    .increment(1);
}
