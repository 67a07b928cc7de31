//! TLS configuration for the local listener.

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;

use crate::error::FrontendError;
use crate::net::authority::CertifiedIdentity;

/// Protocols advertised to the calling tool, in preference order.
pub const LISTENER_ALPN: [&[u8]; 2] = [b"http/1.1", b"h2"];

/// Build the rustls server configuration around `identity`.
pub fn server_config(identity: CertifiedIdentity) -> Result<RustlsConfig, FrontendError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| FrontendError::TlsConfig(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(identity.chain, identity.key)
        .map_err(|e| FrontendError::TlsConfig(e.to_string()))?;

    config.alpn_protocols = LISTENER_ALPN.iter().map(|p| p.to_vec()).collect();

    Ok(RustlsConfig::from_config(Arc::new(config)))
}
