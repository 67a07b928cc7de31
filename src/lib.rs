//! Awesome TLS proxy library.
//!
//! A local forwarding proxy that sends each request upstream with a
//! caller-chosen TLS ClientHello fingerprint. Upstream certificates are
//! deliberately not verified: this is a fingerprint-testing tool, not a
//! trusted HTTP client.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::{ServerConfig, TransportConfig};
pub use error::{FrontendError, ProxyError};
pub use fingerprint::{FingerprintRegistry, FingerprintSource};
pub use http::{HttpServer, ServerHandle};
