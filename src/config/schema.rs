//! Configuration schema definitions.
//!
//! Process-level settings for the proxy. These are loaded once at startup;
//! everything request-specific travels in the configuration header instead
//! (see [`crate::config::transport`]).

use serde::{Deserialize, Serialize};

/// Default listener address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8887";

/// Root configuration for the proxy process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Certificate used to terminate inbound TLS.
    pub authority: AuthorityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8887").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_ADDRESS.to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a whole proxied exchange, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 180 }
    }
}

/// Certificate authority settings.
///
/// With no paths configured a fresh self-signed authority is generated on
/// every start.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthorityConfig {
    /// PEM certificate chain to serve.
    pub cert_path: Option<String>,

    /// PEM private key matching `cert_path`.
    pub key_path: Option<String>,

    /// Where to write the generated certificate so the calling tool can trust it.
    pub export_cert_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "awesome_tls_proxy=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9887".to_string(),
        }
    }
}
