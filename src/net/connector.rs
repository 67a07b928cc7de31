//! Fingerprinted outbound TLS connector.
//!
//! # Responsibilities
//! - Turn a [`HandshakeTemplate`] into a BoringSSL connector
//! - Dial through hyper-util's `HttpConnector` (connect timeout, keep-alive)
//! - Run the handshake with `tokio-boring` and hand hyper a stream
//!
//! # Design Decisions
//! - Upstream certificates are NOT verified. This connector exists to test
//!   fingerprint defenses; never reuse it as a trusted HTTP client.
//! - Session cache is off and a connector is built per request, so no
//!   session ticket or PSK state crosses requests.
//! - Codepoints BoringSSL cannot express are skipped, not rejected.

use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use boring::ssl::{
    SslConnector, SslMethod, SslOptions, SslSessionCacheMode, SslVerifyMode, SslVersion,
};
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper::Uri;
use hyper_util::client::legacy::connect::{Connected, Connection, HttpConnector};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_boring::SslStream;
use tower::Service;

use crate::fingerprint::registry::is_grease;
use crate::fingerprint::HandshakeTemplate;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const EXT_SERVER_NAME: u16 = 0x0000;
const EXT_STATUS_REQUEST: u16 = 0x0005;
const EXT_ALPN: u16 = 0x0010;
const EXT_SCT: u16 = 0x0012;
const EXT_SESSION_TICKET: u16 = 0x0023;

/// Build the BoringSSL connector for one template.
pub fn build_ssl_connector(template: &HandshakeTemplate<'_>) -> Result<SslConnector, String> {
    let mut builder = SslConnector::builder(SslMethod::tls_client()).map_err(|e| e.to_string())?;

    builder.set_verify(SslVerifyMode::NONE);
    builder.set_session_cache_mode(SslSessionCacheMode::OFF);

    let (min, max) = version_range(template);
    builder.set_min_proto_version(Some(min)).map_err(|e| e.to_string())?;
    builder.set_max_proto_version(Some(max)).map_err(|e| e.to_string())?;

    let ciphers = cipher_list(template.cipher_suites);
    if !ciphers.is_empty() {
        builder
            .set_cipher_list(&ciphers)
            .map_err(|e| format!("cipher list {ciphers:?} rejected: {e}"))?;
    } else if version_codes(template).0 < 0x0304 {
        return Err("no usable TLS 1.2 cipher suite in fingerprint".to_string());
    }

    let curves = curve_list(template.supported_groups);
    if !curves.is_empty() {
        builder
            .set_curves_list(&curves)
            .map_err(|e| format!("groups {curves:?} rejected: {e}"))?;
    }

    let sigalgs = sigalg_list(template.signature_algorithms);
    if !sigalgs.is_empty() {
        builder
            .set_sigalgs_list(&sigalgs)
            .map_err(|e| format!("signature algorithms {sigalgs:?} rejected: {e}"))?;
    }

    if template.has_extension(EXT_ALPN) && !template.alpn.is_empty() {
        builder
            .set_alpn_protos(&alpn_wire(&template.alpn))
            .map_err(|e| e.to_string())?;
    }

    if template.has_extension(EXT_STATUS_REQUEST) {
        builder.enable_ocsp_stapling();
    }
    if template.has_extension(EXT_SCT) {
        builder.enable_signed_cert_timestamps();
    }
    if !template.has_extension(EXT_SESSION_TICKET) {
        builder.set_options(SslOptions::NO_TICKET);
    }

    builder.set_grease_enabled(template.grease);
    builder.set_permute_extensions(template.permute_extensions);

    Ok(builder.build())
}

fn version_range(template: &HandshakeTemplate<'_>) -> (SslVersion, SslVersion) {
    let (min, max) = version_codes(template);
    (ssl_version(min), ssl_version(max))
}

fn version_codes(template: &HandshakeTemplate<'_>) -> (u16, u16) {
    let known = |v: &u16| (0x0301..=0x0304).contains(v);
    let mut versions: Vec<u16> = template
        .supported_versions
        .iter()
        .copied()
        .filter(|v| !is_grease(*v) && known(v))
        .collect();
    if versions.is_empty() {
        versions.push(if known(&template.legacy_version) { template.legacy_version } else { 0x0303 });
    }

    let min = versions.iter().copied().min().unwrap_or(0x0303);
    let max = versions.iter().copied().max().unwrap_or(0x0304);
    (min, max)
}

fn ssl_version(code: u16) -> SslVersion {
    match code {
        0x0301 => SslVersion::TLS1,
        0x0302 => SslVersion::TLS1_1,
        0x0304 => SslVersion::TLS1_3,
        _ => SslVersion::TLS1_2,
    }
}

// TLS 1.3 suites are fixed by BoringSSL and therefore not listed.
fn cipher_name(id: u16) -> Option<&'static str> {
    Some(match id {
        0xc02b => "ECDHE-ECDSA-AES128-GCM-SHA256",
        0xc02f => "ECDHE-RSA-AES128-GCM-SHA256",
        0xc02c => "ECDHE-ECDSA-AES256-GCM-SHA384",
        0xc030 => "ECDHE-RSA-AES256-GCM-SHA384",
        0xcca9 => "ECDHE-ECDSA-CHACHA20-POLY1305",
        0xcca8 => "ECDHE-RSA-CHACHA20-POLY1305",
        0xc009 => "ECDHE-ECDSA-AES128-SHA",
        0xc00a => "ECDHE-ECDSA-AES256-SHA",
        0xc013 => "ECDHE-RSA-AES128-SHA",
        0xc014 => "ECDHE-RSA-AES256-SHA",
        0x009c => "AES128-GCM-SHA256",
        0x009d => "AES256-GCM-SHA384",
        0x002f => "AES128-SHA",
        0x0035 => "AES256-SHA",
        0x000a => "DES-CBC3-SHA",
        _ => return None,
    })
}

fn group_name(id: u16) -> Option<&'static str> {
    Some(match id {
        0x001d => "X25519",
        0x0017 => "P-256",
        0x0018 => "P-384",
        0x0019 => "P-521",
        _ => return None,
    })
}

fn sigalg_name(id: u16) -> Option<&'static str> {
    Some(match id {
        0x0403 => "ECDSA+SHA256",
        0x0503 => "ECDSA+SHA384",
        0x0603 => "ECDSA+SHA512",
        0x0804 => "RSA-PSS+SHA256",
        0x0805 => "RSA-PSS+SHA384",
        0x0806 => "RSA-PSS+SHA512",
        0x0401 => "RSA+SHA256",
        0x0501 => "RSA+SHA384",
        0x0601 => "RSA+SHA512",
        0x0807 => "ed25519",
        _ => return None,
    })
}

fn joined(ids: &[u16], name: fn(u16) -> Option<&'static str>, what: &str) -> String {
    let mut names: Vec<&str> = Vec::with_capacity(ids.len());
    for &id in ids.iter().filter(|&&id| !is_grease(id)) {
        match name(id) {
            Some(n) if !names.contains(&n) => names.push(n),
            Some(_) => {}
            None => tracing::debug!(codepoint = %format!("0x{id:04x}"), kind = what, "Skipping unsupported codepoint"),
        }
    }
    names.join(":")
}

fn cipher_list(ids: &[u16]) -> String {
    let tls12: Vec<u16> = ids.iter().copied().filter(|id| !(0x1301..=0x1305).contains(id)).collect();
    joined(&tls12, cipher_name, "cipher")
}

fn curve_list(ids: &[u16]) -> String {
    joined(ids, group_name, "group")
}

fn sigalg_list(ids: &[u16]) -> String {
    joined(ids, sigalg_name, "sigalg")
}

fn alpn_wire(protocols: &[&str]) -> Vec<u8> {
    let mut wire = Vec::new();
    for proto in protocols.iter().filter(|p| !p.is_empty() && p.len() <= 255) {
        wire.push(proto.len() as u8);
        wire.extend_from_slice(proto.as_bytes());
    }
    wire
}

/// Connector handed to the hyper-util client.
#[derive(Clone)]
pub struct FingerprintConnector {
    http: HttpConnector,
    tls: SslConnector,
    send_sni: bool,
}

impl FingerprintConnector {
    pub fn new(http: HttpConnector, tls: SslConnector, template: &HandshakeTemplate<'_>) -> Self {
        Self {
            http,
            tls,
            send_sni: template.has_extension(EXT_SERVER_NAME),
        }
    }
}

impl Service<Uri> for FingerprintConnector {
    type Response = UpstreamStream;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.http.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let connecting = self.http.call(uri.clone());
        let tls = self.tls.clone();
        let send_sni = self.send_sni;

        Box::pin(async move {
            let tcp = connecting.await?.into_inner();
            if uri.scheme_str() != Some("https") {
                return Ok(UpstreamStream::Plain(TokioIo::new(tcp)));
            }

            let host = uri
                .host()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no host"))?
                .trim_start_matches('[')
                .trim_end_matches(']')
                .to_string();

            let mut config = tls.configure()?;
            config.set_verify_hostname(false);
            config.set_use_server_name_indication(send_sni && host.parse::<IpAddr>().is_err());

            let stream = tokio_boring::connect(config, &host, tcp)
                .await
                .map_err(|e| io::Error::other(format!("TLS handshake with {host} failed: {e}")))?;

            tracing::debug!(
                host = %host,
                alpn = ?stream.ssl().selected_alpn_protocol().map(String::from_utf8_lossy),
                version = stream.ssl().version_str(),
                "Upstream TLS established"
            );
            Ok(UpstreamStream::Tls(TokioIo::new(stream)))
        })
    }
}

/// A dialed upstream connection, plain or TLS.
pub enum UpstreamStream {
    Plain(TokioIo<TcpStream>),
    Tls(TokioIo<SslStream<TcpStream>>),
}

impl Connection for UpstreamStream {
    fn connected(&self) -> Connected {
        match self {
            UpstreamStream::Plain(stream) => stream.connected(),
            UpstreamStream::Tls(stream) => {
                let tls = stream.inner();
                let connected = tls.get_ref().connected();
                if tls.ssl().selected_alpn_protocol() == Some(&b"h2"[..]) {
                    connected.negotiated_h2()
                } else {
                    connected
                }
            }
        }
    }
}

impl Read for UpstreamStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            UpstreamStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            UpstreamStream::Tls(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl Write for UpstreamStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            UpstreamStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            UpstreamStream::Tls(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            UpstreamStream::Plain(s) => Pin::new(s).poll_flush(cx),
            UpstreamStream::Tls(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            UpstreamStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            UpstreamStream::Tls(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}
