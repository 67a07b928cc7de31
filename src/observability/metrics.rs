//! Metrics collection and exposition.
//!
//! # Metrics
//! - `awesome_tls_requests_total` (counter): requests by outcome and fingerprint source
//! - `awesome_tls_request_duration_seconds` (histogram): end-to-end latency
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing when the Prometheus listener is off.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "awesome_tls_requests_total";
pub const REQUEST_DURATION: &str = "awesome_tls_request_duration_seconds";

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| e.to_string())?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Requests relayed, by outcome and fingerprint source");
    metrics::describe_histogram!(REQUEST_DURATION, "Time from request arrival to response");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(outcome: &'static str, source: &str, start: Instant) {
    metrics::counter!(REQUESTS_TOTAL, "outcome" => outcome, "source" => source.to_string())
        .increment(1);
    metrics::histogram!(REQUEST_DURATION, "outcome" => outcome).record(start.elapsed().as_secs_f64());
}
