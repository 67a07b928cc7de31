//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Let `RUST_LOG` override the configured filter
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Human-readable fmt output; the operator watches a console

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the settings file supply one.
pub const DEFAULT_FILTER: &str = "awesome_tls_proxy=info,tower_http=info";

/// Pick the effective filter directive.
pub fn filter_directive(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = if configured.trim().is_empty() {
            DEFAULT_FILTER
        } else {
            configured
        };
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(configured: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter_directive(configured))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
