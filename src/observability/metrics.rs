//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_exchanges_total` (counter): exchanges by method and reply status
//! - `proxy_upstream_failures_total` (counter): transport failures by kind
//! - `proxy_exchange_duration_seconds` (histogram): end-to-end latency by method
//!
//! Recording goes through the `metrics` facade and is a no-op until an
//! exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::upstream::TransportErrorKind;

/// Install the Prometheus exporter with an HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed exchange.
pub fn record_exchange(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_exchanges_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_exchange_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a transport failure reaching upstream.
pub fn record_upstream_failure(kind: TransportErrorKind) {
    metrics::counter!("proxy_upstream_failures_total", "kind" => kind.as_str()).increment(1);
}
