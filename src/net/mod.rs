//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Calling tool
//!     → listener.rs (bind host:port)
//!     → tls.rs (rustls, identity from authority.rs)
//!     → HTTP layer
//!     → connector.rs (fingerprinted ClientHello via BoringSSL)
//!     → Upstream server
//! ```
//!
//! # Design Decisions
//! - Inbound and outbound TLS use different stacks: rustls terminates the
//!   local side, BoringSSL shapes the upstream handshake
//! - Upstream certificates are never verified

pub mod authority;
pub mod connector;
pub mod listener;
pub mod tls;

pub use authority::{
    AuthorityError, CertificateAuthorityProvider, CertifiedIdentity, EphemeralAuthority,
    PemFileAuthority,
};
pub use connector::{FingerprintConnector, UpstreamStream};
pub use listener::Listener;
