//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define request metrics shared by both transports
//! - Expose Prometheus-compatible metrics endpoint (live socket only)
//!
//! # Metrics
//! - `switchyard_requests_total` (counter): requests by transport, method, status
//! - `switchyard_request_duration_seconds` (histogram): handler latency by transport
//!
//! # Design Decisions
//! - Recording is always on; without an installed recorder it is a no-op
//! - Labels stay low-cardinality: no paths, only the method and status;
//!   extension methods collapse to `OTHER`

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "switchyard_request_duration_seconds";

/// Install the Prometheus recorder and its scrape listener. Must be called
/// from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Requests handled, by transport, method and status");
    metrics::describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time from dispatch to commit"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Label value for `method`. The request line is client controlled, so only
/// the standard methods get their own label.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::HEAD => "HEAD",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::PATCH => "PATCH",
        Method::DELETE => "DELETE",
        Method::CONNECT => "CONNECT",
        Method::OPTIONS => "OPTIONS",
        Method::TRACE => "TRACE",
        _ => "OTHER",
    }
}

/// Record one handled request.
pub fn record_request(transport: &'static str, method: &Method, status: u16, start: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "transport" => transport,
        "method" => method_label(method),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(REQUEST_DURATION_SECONDS, "transport" => transport)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_label_is_bounded() {
        assert_eq!(method_label(&Method::GET), "GET");
        assert_eq!(method_label(&Method::TRACE), "TRACE");

        let propfind = Method::from_bytes(b"PROPFIND").unwrap();
        assert_eq!(method_label(&propfind), "OTHER");
        let junk = Method::from_bytes(b"X-RANDOM-1234").unwrap();
        assert_eq!(method_label(&junk), "OTHER");
    }
}
