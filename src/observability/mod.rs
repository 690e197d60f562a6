//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, server and gateway produce:
//!     → logging.rs (structured log events, request ID in fields/spans)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through spans on both transports
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
