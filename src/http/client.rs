//! Per-request outbound client construction.
//!
//! # Responsibilities
//! - Substitute dial, keep-alive and idle defaults for unset (zero) values
//! - Build a fingerprinted connector for the resolved source
//! - Wrap it in a hyper-util client that never follows redirects
//!
//! # Design Decisions
//! - One client per request, dropped with the request; the idle pool only
//!   lives as long as that single exchange
//! - The client does not verify upstream certificates

use std::time::Duration;

use axum::body::Body;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::TransportConfig;
use crate::error::ClientError;
use crate::fingerprint::FingerprintSource;
use crate::net::connector::{build_ssl_connector, FingerprintConnector};

pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
pub const MAX_IDLE_CONNECTIONS: usize = 100;

/// Dialer and pool timings after default substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialSettings {
    pub dial_timeout: Duration,
    pub keep_alive: Duration,
    pub idle_timeout: Duration,
}

fn or_default(secs: u64, default: Duration) -> Duration {
    if secs == 0 {
        default
    } else {
        Duration::from_secs(secs)
    }
}

impl DialSettings {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            dial_timeout: or_default(config.dial_timeout_secs, DEFAULT_DIAL_TIMEOUT),
            keep_alive: or_default(config.keep_alive_interval_secs, DEFAULT_KEEP_ALIVE),
            idle_timeout: or_default(config.idle_conn_timeout_secs, DEFAULT_IDLE_TIMEOUT),
        }
    }
}

/// Ephemeral client bound to one fingerprint source.
pub struct OutboundClient {
    inner: Client<FingerprintConnector, Body>,
    settings: DialSettings,
}

impl OutboundClient {
    /// Build the client for a single request.
    pub fn build(
        config: &TransportConfig,
        source: &FingerprintSource,
    ) -> Result<Self, ClientError> {
        let settings = DialSettings::from_config(config);
        let template = source.template();

        let tls = build_ssl_connector(&template).map_err(|reason| {
            ClientError::ConstructionFailed(format!("fingerprint {}: {reason}", source.label()))
        })?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(settings.dial_timeout));
        http.set_keepalive(Some(settings.keep_alive));
        http.set_nodelay(true);

        let connector = FingerprintConnector::new(http, tls, &template);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(settings.idle_timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .pool_timer(TokioTimer::new())
            .build(connector);

        Ok(Self { inner, settings })
    }

    pub fn settings(&self) -> DialSettings {
        self.settings
    }

    pub(crate) fn inner(&self) -> &Client<FingerprintConnector, Body> {
        &self.inner
    }
}
