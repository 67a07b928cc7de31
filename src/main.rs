//! Awesome TLS proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────────┐
//!                          │                  AWESOME TLS PROXY                    │
//!                          │                                                       │
//!   Calling tool           │  ┌──────────┐   ┌──────────┐   ┌────────────────┐     │
//!   (TLS, config header) ──┼─▶│ net::tls │──▶│  http    │──▶│  fingerprint   │     │
//!                          │  │ listener │   │  server  │   │ resolve/decode │     │
//!                          │  └──────────┘   └──────────┘   └───────┬────────┘     │
//!                          │                                        ▼              │
//!                          │  ┌──────────┐   ┌──────────┐   ┌────────────────┐     │
//!   Relayed response  ◀────┼──│ response │◀──│ forward  │◀──│ client +       │◀────┼── Upstream
//!                          │  │          │   │          │   │ net::connector │     │
//!                          │  └──────────┘   └──────────┘   └────────────────┘     │
//!                          └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use awesome_tls_proxy::config::loader::{load_config, LoadError};
use awesome_tls_proxy::config::validation::validate_config;
use awesome_tls_proxy::config::ServerConfig;
use awesome_tls_proxy::fingerprint::{FingerprintRegistry, DEFAULT_PROFILE};
use awesome_tls_proxy::lifecycle::{run, shutdown_signal};
use awesome_tls_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "awesome-tls-proxy")]
#[command(about = "Local proxy that relays requests with a chosen TLS fingerprint", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the settings file
    #[arg(short, long)]
    address: Option<String>,

    /// Print the registered fingerprint profiles and exit
    #[arg(long)]
    list_fingerprints: bool,
}

fn settings(cli: &Cli) -> Result<ServerConfig, LoadError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(address) = &cli.address {
        config.listener.bind_address = address.clone();
    }
    validate_config(&config).map_err(LoadError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_fingerprints {
        for name in FingerprintRegistry::global().names() {
            let marker = if name == DEFAULT_PROFILE { " (default)" } else { "" };
            println!("{name}{marker}");
        }
        return ExitCode::SUCCESS;
    }

    let config = match settings(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("awesome-tls-proxy: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_filter);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        profiles = FingerprintRegistry::global().count(),
        "awesome-tls-proxy v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match run(config, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Proxy failed");
            ExitCode::FAILURE
        }
    }
}
