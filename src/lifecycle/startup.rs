//! Startup orchestration.
//!
//! # Responsibilities
//! - Pick the certificate authority from the settings
//! - Start the metrics endpoint when enabled
//! - Start the frontend, wait for a stop signal, then drain
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener starts last (traffic only when ready)

use std::future::Future;

use crate::config::ServerConfig;
use crate::error::FrontendError;
use crate::http::HttpServer;
use crate::net::authority::{CertificateAuthorityProvider, EphemeralAuthority, PemFileAuthority};
use crate::observability::metrics;

/// Authority described by the `[authority]` settings.
pub fn authority_from_config(config: &ServerConfig) -> Box<dyn CertificateAuthorityProvider> {
    let authority = &config.authority;
    match (&authority.cert_path, &authority.key_path) {
        (Some(cert), Some(key)) => Box::new(PemFileAuthority::new(cert, key)),
        _ => {
            let ephemeral = EphemeralAuthority::new();
            match &authority.export_cert_path {
                Some(path) => Box::new(ephemeral.with_export(path)),
                None => Box::new(ephemeral),
            }
        }
    }
}

/// Serve until `shutdown` resolves, then stop gracefully.
pub async fn run<S>(config: ServerConfig, shutdown: S) -> Result<(), FrontendError>
where
    S: Future<Output = ()>,
{
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let authority = authority_from_config(&config);

    let handle = HttpServer::new(config)
        .start(&address, authority.as_ref())
        .await?;

    shutdown.await;
    handle.stop().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
