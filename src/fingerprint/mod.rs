//! TLS fingerprint selection subsystem.
//!
//! # Data Flow
//! ```text
//! TransportConfig
//!     → resolver.rs (raw capture? named profile? default?)
//!         → client_hello.rs (hex → CustomClientHelloSpec)
//!         → registry.rs (sanitized name → FingerprintProfile)
//!     → FingerprintSource (exactly one per request)
//!     → HandshakeTemplate (borrowed view consumed by the TLS connector)
//! ```

pub mod client_hello;
pub mod registry;
pub mod resolver;

use thiserror::Error;

pub use client_hello::CustomClientHelloSpec;
pub use registry::{FingerprintProfile, FingerprintRegistry, DEFAULT_PROFILE};
pub use resolver::{resolve, sanitize};

/// Errors produced while resolving a fingerprint.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("decode HexClientHello: {0}")]
    InvalidHexEncoding(#[from] hex::FromHexError),

    #[error("unparsable ClientHello: {0}")]
    UnparsableClientHello(String),
}

/// The single fingerprint source active for one request.
#[derive(Debug, Clone)]
pub enum FingerprintSource {
    Profile(&'static FingerprintProfile),
    Custom(CustomClientHelloSpec),
}

impl FingerprintSource {
    /// Short name for logs and metrics.
    pub fn label(&self) -> &str {
        match self {
            FingerprintSource::Profile(profile) => profile.name,
            FingerprintSource::Custom(_) => "custom",
        }
    }

    pub fn profile(&self) -> Option<&'static FingerprintProfile> {
        match self {
            FingerprintSource::Profile(profile) => Some(profile),
            FingerprintSource::Custom(_) => None,
        }
    }

    /// Lower the source into the parameters the handshake generator reads.
    pub fn template(&self) -> HandshakeTemplate<'_> {
        match self {
            FingerprintSource::Profile(p) => HandshakeTemplate {
                cipher_suites: p.cipher_suites,
                extensions: p.extensions,
                alpn: p.alpn.to_vec(),
                supported_groups: p.supported_groups,
                signature_algorithms: p.signature_algorithms,
                supported_versions: p.supported_versions,
                legacy_version: 0x0303,
                grease: p.uses_grease(),
                permute_extensions: p.permute_extensions,
            },
            FingerprintSource::Custom(spec) => HandshakeTemplate {
                cipher_suites: &spec.cipher_suites,
                extensions: &spec.extensions,
                alpn: spec.alpn.iter().map(String::as_str).collect(),
                supported_groups: &spec.supported_groups,
                signature_algorithms: &spec.signature_algorithms,
                supported_versions: &spec.supported_versions,
                legacy_version: spec.legacy_version,
                grease: spec.grease,
                permute_extensions: false,
            },
        }
    }
}

/// Handshake parameters, independent of where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeTemplate<'a> {
    pub cipher_suites: &'a [u16],
    pub extensions: &'a [u16],
    pub alpn: Vec<&'a str>,
    pub supported_groups: &'a [u16],
    pub signature_algorithms: &'a [u16],
    pub supported_versions: &'a [u16],
    pub legacy_version: u16,
    pub grease: bool,
    pub permute_extensions: bool,
}

impl HandshakeTemplate<'_> {
    pub fn has_extension(&self, ext_type: u16) -> bool {
        self.extensions.contains(&ext_type)
    }
}
