//! Certificate authority for the local TLS listener.
//!
//! # Responsibilities
//! - Produce the certificate and key the listener presents to the calling tool
//! - Generate a fresh self-signed CA per process by default
//! - Optionally load a stable CA from PEM files instead
//!
//! # Design Decisions
//! - The generated CA is presented directly as the server certificate; the
//!   calling tool is expected to skip or pin verification for it
//! - Generation lives behind a trait so the server never depends on rcgen

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

/// Common name of the generated CA.
pub const CA_COMMON_NAME: &str = "Awesome TLS CA";

const CA_VALIDITY_DAYS: i64 = 365;

/// Errors raised while producing the listener identity.
#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("generate certificate: {0}")]
    Generation(#[from] rcgen::Error),

    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {0}")]
    MissingCertificate(PathBuf),

    #[error("no private key found in {0}")]
    MissingPrivateKey(PathBuf),
}

/// Certificate chain plus matching private key.
#[derive(Debug)]
pub struct CertifiedIdentity {
    pub chain: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

/// Source of the identity the listener presents.
pub trait CertificateAuthorityProvider: Send + Sync {
    fn provide(&self) -> Result<CertifiedIdentity, AuthorityError>;
}

/// Self-signed CA generated in memory on every call.
#[derive(Debug, Clone, Default)]
pub struct EphemeralAuthority {
    export_path: Option<PathBuf>,
}

impl EphemeralAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write the generated certificate (never the key) as PEM.
    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }
}

impl CertificateAuthorityProvider for EphemeralAuthority {
    fn provide(&self) -> Result<CertifiedIdentity, AuthorityError> {
        let key_pair = KeyPair::generate()?;

        let mut params =
            CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()])?;
        params
            .distinguished_name
            .push(DnType::CommonName, CA_COMMON_NAME);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        let now = OffsetDateTime::now_utc();
        params.not_before = now - Duration::days(1);
        params.not_after = now + Duration::days(CA_VALIDITY_DAYS);

        let cert = params.self_signed(&key_pair)?;

        if let Some(path) = &self.export_path {
            fs::write(path, cert.pem()).map_err(|source| AuthorityError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Exported CA certificate");
        }

        tracing::debug!(common_name = CA_COMMON_NAME, "Generated ephemeral CA");

        Ok(CertifiedIdentity {
            chain: vec![cert.der().clone()],
            key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der())),
        })
    }
}

/// CA certificate and key loaded from PEM files.
#[derive(Debug, Clone)]
pub struct PemFileAuthority {
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl PemFileAuthority {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }
}

fn open(path: &Path) -> Result<BufReader<fs::File>, AuthorityError> {
    fs::File::open(path)
        .map(BufReader::new)
        .map_err(|source| AuthorityError::Io {
            path: path.to_path_buf(),
            source,
        })
}

impl CertificateAuthorityProvider for PemFileAuthority {
    fn provide(&self) -> Result<CertifiedIdentity, AuthorityError> {
        let chain = rustls_pemfile::certs(&mut open(&self.cert_path)?)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| AuthorityError::Io {
                path: self.cert_path.clone(),
                source,
            })?;
        if chain.is_empty() {
            return Err(AuthorityError::MissingCertificate(self.cert_path.clone()));
        }

        let key = rustls_pemfile::private_key(&mut open(&self.key_path)?)
            .map_err(|source| AuthorityError::Io {
                path: self.key_path.clone(),
                source,
            })?
            .ok_or_else(|| AuthorityError::MissingPrivateKey(self.key_path.clone()))?;

        tracing::info!(cert_path = %self.cert_path.display(), "Loaded CA from PEM files");
        Ok(CertifiedIdentity { chain, key })
    }
}
