//! Per-request fingerprint resolution.
//!
//! Precedence: a raw capture always wins; otherwise the sanitized profile
//! name is looked up; a miss (including `Default`) falls back to the
//! registry default. Resolution never yields "no fingerprint".

use crate::config::TransportConfig;

use super::client_hello::CustomClientHelloSpec;
use super::registry::FingerprintRegistry;
use super::{FingerprintError, FingerprintSource};

/// Literal the calling tool sends for "no explicit profile".
pub const DEFAULT_SENTINEL: &str = "Default";

/// Normalize a display name such as `Chrome 120.0.1` into a registry key.
///
/// Only the first space-delimited token is lower-cased; dots become
/// underscores in every token and tokens are joined with underscores.
pub fn sanitize(fingerprint: &str) -> String {
    if fingerprint == DEFAULT_SENTINEL {
        return String::new();
    }

    fingerprint
        .split(' ')
        .enumerate()
        .map(|(i, part)| {
            let part = part.trim();
            let part = if i == 0 { part.to_lowercase() } else { part.to_string() };
            part.replace('.', "_")
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Decide which fingerprint source the outbound handshake must use.
pub fn resolve(
    config: &TransportConfig,
    registry: &'static FingerprintRegistry,
) -> Result<FingerprintSource, FingerprintError> {
    if config.has_raw_client_hello() {
        let spec = CustomClientHelloSpec::from_hex(&config.raw_client_hello)?;
        tracing::debug!(
            cipher_suites = spec.cipher_suites.len(),
            extensions = spec.extensions.len(),
            "Using captured ClientHello"
        );
        return Ok(FingerprintSource::Custom(spec));
    }

    let name = sanitize(&config.fingerprint);
    match registry.get(&name) {
        Some(profile) => Ok(FingerprintSource::Profile(profile)),
        None => {
            if !name.is_empty() {
                tracing::debug!(requested = %name, "Unknown fingerprint, using default profile");
            }
            Ok(FingerprintSource::Profile(registry.default_profile()))
        }
    }
}
