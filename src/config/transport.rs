//! Per-request transport configuration.
//!
//! The calling tool serializes one [`TransportConfig`] into the
//! `Awesometlsconfig` header of every request it routes through the proxy.
//! Parsing is pure: unset timeouts stay at zero here and are replaced by
//! their defaults when the outbound client is built.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors produced while decoding the configuration header.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The header was absent, empty or whitespace only.
    #[error("missing transport configuration")]
    MissingConfiguration,

    /// The header did not decode into the expected JSON object.
    #[error("malformed transport configuration: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// Scheme used to reach the real target. Matched case-insensitively, like
/// URL schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Scheme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.eq_ignore_ascii_case("http") {
            Ok(Scheme::Http)
        } else if raw.eq_ignore_ascii_case("https") {
            Ok(Scheme::Https)
        } else {
            Err(serde::de::Error::unknown_variant(&raw, &["http", "https"]))
        }
    }
}

/// Decoded form of the configuration header. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Hostname (optionally with port) to send the request to.
    #[serde(rename = "Host")]
    pub host: String,

    #[serde(rename = "Scheme")]
    pub scheme: Scheme,

    /// Profile name, or the literal `Default`.
    #[serde(rename = "Fingerprint", default, deserialize_with = "null_as_default")]
    pub fingerprint: String,

    /// Hex-encoded raw ClientHello. Wins over `fingerprint` when non-empty.
    #[serde(rename = "HexClientHello", default, deserialize_with = "null_as_default")]
    pub raw_client_hello: String,

    /// Dial timeout in seconds, 0 when unset.
    #[serde(rename = "HttpTimeout", default, deserialize_with = "null_as_default")]
    pub dial_timeout_secs: u64,

    /// TCP keep-alive interval in seconds, 0 when unset.
    #[serde(rename = "HttpKeepAliveInterval", default, deserialize_with = "null_as_default")]
    pub keep_alive_interval_secs: u64,

    /// Idle pooled connection timeout in seconds, 0 when unset.
    #[serde(rename = "IdleConnTimeout", default, deserialize_with = "null_as_default")]
    pub idle_conn_timeout_secs: u64,
}

impl TransportConfig {
    /// Decode the raw header value.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Err(ConfigError::MissingConfiguration);
        }

        Ok(serde_json::from_str(raw)?)
    }

    /// Whether a raw ClientHello capture was supplied.
    pub fn has_raw_client_hello(&self) -> bool {
        !self.raw_client_hello.is_empty()
    }
}

// Gson and friends may emit explicit nulls for unset fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
