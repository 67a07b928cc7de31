//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Frontend + forwarder produce:
//!     → logging.rs (structured log events, request id per request)
//!     → metrics.rs (request counter, latency histogram)
//!
//! Consumers:
//!     → Operator console (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
