//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection from the calling tool
//!     → server.rs (Axum setup, config header stripped, request id)
//!     → config::transport (header → TransportConfig)
//!     → fingerprint::resolve (→ FingerprintSource)
//!     → client.rs (ephemeral fingerprinted client)
//!     → forward.rs (rewrite target, send, buffer response)
//!     → response.rs (errors → 500 text/plain)
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod response;
pub mod server;

pub use client::{DialSettings, OutboundClient};
pub use server::{HttpServer, ServerHandle, CONFIGURATION_HEADER};
