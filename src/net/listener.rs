//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve and bind the configured address synchronously
//! - Report bind failures before any task is spawned
//! - Hand a non-blocking std listener to axum-server

use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

use crate::error::FrontendError;

/// A bound listener plus the address it actually got.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address` (`host:port`; port 0 picks a free port).
    pub fn bind(address: &str) -> Result<Self, FrontendError> {
        let bind_failed = |source: std::io::Error| FrontendError::ListenerBindFailed {
            address: address.to_string(),
            source,
        };

        let addrs: Vec<SocketAddr> = address.to_socket_addrs().map_err(bind_failed)?.collect();
        let inner = TcpListener::bind(&addrs[..]).map_err(bind_failed)?;
        inner.set_nonblocking(true).map_err(bind_failed)?;
        let local_addr = inner.local_addr().map_err(bind_failed)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}
