//! Error kinds surfaced by the proxy.
//!
//! Every per-request failure funnels into [`ProxyError`], which renders as a
//! `500 Internal Server Error` whose plain-text body starts with
//! [`ERROR_PREFIX`]. Frontend errors are returned to the embedding program
//! instead.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::fingerprint::FingerprintError;
use crate::net::authority::AuthorityError;

/// Prefix of every error body written back to the calling tool.
pub const ERROR_PREFIX: &str = "Awesome TLS error: ";

/// Failure to assemble the outbound client for a request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("construct client: {0}")]
    ConstructionFailed(String),
}

/// Failure while talking to the upstream.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("read upstream body: {0}")]
    BodyReadFailed(String),

    #[error("request exceeded the {0}s deadline")]
    DeadlineExceeded(u64),
}

/// Failure to bring up or run the local listener.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("bind {address}: {source}")]
    ListenerBindFailed {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("certificate authority: {0}")]
    Authority(#[from] AuthorityError),

    #[error("TLS server configuration: {0}")]
    TlsConfig(String),

    #[error("serve: {0}")]
    Serve(#[source] io::Error),
}

/// Umbrella for per-request failures.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ProxyError {
    /// Label used for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Config(_) => "config_error",
            ProxyError::Fingerprint(_) => "fingerprint_error",
            ProxyError::Client(_) => "client_error",
            ProxyError::Transport(TransportError::DeadlineExceeded(_)) => "deadline_exceeded",
            ProxyError::Transport(_) => "transport_error",
        }
    }

    /// Body text written back to the calling tool.
    pub fn body(&self) -> String {
        format!("{ERROR_PREFIX}{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_prefix_and_underlying_message() {
        let err: ProxyError = ConfigError::MissingConfiguration.into();
        assert_eq!(err.body(), "Awesome TLS error: missing transport configuration");
    }

    #[test]
    fn hex_failure_mentions_field_name() {
        let err: ProxyError = FingerprintError::from(hex::decode("abc").unwrap_err()).into();
        assert!(err.body().starts_with(ERROR_PREFIX));
        assert!(err.body().contains("decode HexClientHello"));
        assert_eq!(err.kind(), "fingerprint_error");
    }

    #[test]
    fn deadline_has_its_own_outcome() {
        let err: ProxyError = TransportError::DeadlineExceeded(180).into();
        assert_eq!(err.kind(), "deadline_exceeded");
        assert!(err.body().contains("180s"));
    }
}
