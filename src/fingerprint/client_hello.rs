//! Decoding of captured ClientHello messages.
//!
//! Accepts either a whole TLS record (`16 03 xx ...`) or a bare handshake
//! message (`01 ...`). Framing is handled by `tls-parser`; the extension
//! block is walked by hand so the exact type order survives, including
//! GREASE and codepoints the parser does not know.

use tls_parser::{
    parse_tls_extension, parse_tls_message_handshake, parse_tls_plaintext, TlsClientHelloContents,
    TlsExtension, TlsMessage, TlsMessageHandshake,
};

use super::registry::is_grease;
use super::FingerprintError;

const RECORD_HANDSHAKE: u8 = 0x16;
const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;

/// Structured view of one captured ClientHello. Built per request, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomClientHelloSpec {
    pub legacy_version: u16,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    /// Extension types in wire order.
    pub extensions: Vec<u16>,
    pub alpn: Vec<String>,
    pub supported_groups: Vec<u16>,
    pub ec_point_formats: Vec<u8>,
    pub signature_algorithms: Vec<u16>,
    pub supported_versions: Vec<u16>,
    pub psk_modes: Vec<u8>,
    pub server_name: Option<String>,
    pub grease: bool,
}

impl CustomClientHelloSpec {
    /// Hex-decode and parse a capture.
    pub fn from_hex(hex_client_hello: &str) -> Result<Self, FingerprintError> {
        let raw = hex::decode(hex_client_hello)?;
        Self::parse(&raw)
    }

    /// Parse raw capture bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, FingerprintError> {
        match raw.first() {
            Some(&RECORD_HANDSHAKE) => {
                let (_, record) = parse_tls_plaintext(raw)
                    .map_err(|e| unparsable(format!("invalid TLS record: {e:?}")))?;
                record
                    .msg
                    .iter()
                    .find_map(|msg| match msg {
                        TlsMessage::Handshake(TlsMessageHandshake::ClientHello(hello)) => {
                            Some(Self::from_contents(hello))
                        }
                        _ => None,
                    })
                    .unwrap_or_else(|| Err(unparsable("record does not carry a ClientHello")))
            }
            Some(&HANDSHAKE_CLIENT_HELLO) => {
                let (_, msg) = parse_tls_message_handshake(raw)
                    .map_err(|e| unparsable(format!("invalid handshake message: {e:?}")))?;
                match msg {
                    TlsMessage::Handshake(TlsMessageHandshake::ClientHello(hello)) => {
                        Self::from_contents(&hello)
                    }
                    _ => Err(unparsable("handshake message is not a ClientHello")),
                }
            }
            Some(other) => Err(unparsable(format!("unexpected leading byte 0x{other:02x}"))),
            None => Err(unparsable("empty ClientHello")),
        }
    }

    fn from_contents(hello: &TlsClientHelloContents<'_>) -> Result<Self, FingerprintError> {
        if hello.ciphers.is_empty() {
            return Err(unparsable("ClientHello offers no cipher suites"));
        }

        let mut spec = CustomClientHelloSpec {
            legacy_version: hello.version.0,
            cipher_suites: hello.ciphers.iter().map(|c| c.0).collect(),
            compression_methods: hello.comp.iter().map(|c| c.0).collect(),
            ..Default::default()
        };

        if let Some(block) = hello.ext {
            spec.read_extensions(block)?;
        }

        spec.grease = spec.cipher_suites.iter().any(|&c| is_grease(c))
            || spec.extensions.iter().any(|&e| is_grease(e))
            || spec.supported_groups.iter().any(|&g| is_grease(g));

        Ok(spec)
    }

    fn read_extensions(&mut self, mut block: &[u8]) -> Result<(), FingerprintError> {
        while !block.is_empty() {
            if block.len() < 4 {
                return Err(unparsable("truncated extension header"));
            }
            let ext_type = u16::from_be_bytes([block[0], block[1]]);
            let len = u16::from_be_bytes([block[2], block[3]]) as usize;
            if block.len() < 4 + len {
                return Err(unparsable(format!("truncated extension 0x{ext_type:04x}")));
            }
            let (whole, rest) = block.split_at(4 + len);
            self.extensions.push(ext_type);

            match parse_tls_extension(whole) {
                Ok((_, ext)) => self.absorb(ext),
                Err(_) => tracing::debug!(ext_type, "keeping opaque extension"),
            }
            block = rest;
        }
        Ok(())
    }

    fn absorb(&mut self, ext: TlsExtension<'_>) {
        match ext {
            TlsExtension::SNI(names) => {
                self.server_name = names
                    .iter()
                    .find_map(|(_, name)| std::str::from_utf8(name).ok())
                    .map(str::to_owned);
            }
            TlsExtension::ALPN(protocols) => {
                self.alpn = protocols
                    .iter()
                    .map(|p| String::from_utf8_lossy(p).into_owned())
                    .collect();
            }
            TlsExtension::EllipticCurves(groups) => {
                self.supported_groups = groups.iter().map(|g| g.0).collect();
            }
            TlsExtension::EcPointFormats(formats) => self.ec_point_formats = formats.to_vec(),
            TlsExtension::SignatureAlgorithms(algs) => self.signature_algorithms = algs,
            TlsExtension::SupportedVersions(versions) => {
                self.supported_versions = versions.iter().map(|v| v.0).collect();
            }
            TlsExtension::PskExchangeModes(modes) => self.psk_modes = modes,
            _ => {}
        }
    }

    pub fn has_extension(&self, ext_type: u16) -> bool {
        self.extensions.contains(&ext_type)
    }
}

fn unparsable(reason: impl Into<String>) -> FingerprintError {
    FingerprintError::UnparsableClientHello(reason.into())
}
