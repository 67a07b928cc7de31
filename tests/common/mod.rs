//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use awesome_tls_proxy::config::ServerConfig;
use awesome_tls_proxy::net::EphemeralAuthority;
use awesome_tls_proxy::{HttpServer, ServerHandle};

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Captured {
    /// Request line and headers, exactly as received.
    pub head: String,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim().to_string())
        })
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<Captured> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut captured = Captured {
        head,
        body: buf[head_end..].to_vec(),
    };
    let length: usize = captured
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while captured.body.len() < length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        captured.body.extend_from_slice(&chunk[..n]);
    }
    Some(captured)
}

/// Start a programmable mock backend; `f` maps each request to a raw HTTP response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(Captured) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    let response = f(request).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });
        }
    });

    addr
}

/// Build a raw HTTP/1.1 response with an exact Content-Length.
pub fn raw_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));
    response
}

/// Backend that answers 200 with the request head and body it received.
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|request: Captured| async move {
        let mut echoed = request.head.clone();
        echoed.push_str(&String::from_utf8_lossy(&request.body));
        raw_response("200 OK", &[("Content-Type", "text/plain")], &echoed)
    })
    .await
}

/// Backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// TCP tap in front of `target`: records the first TLS record of every
/// connection (the ClientHello), then relays bytes both ways untouched.
pub async fn start_hello_tap(target: SocketAddr) -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut inbound, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut record = vec![0u8; 5];
                if inbound.read_exact(&mut record).await.is_err() {
                    return;
                }
                let len = u16::from_be_bytes([record[3], record[4]]) as usize;
                record.resize(5 + len, 0);
                if inbound.read_exact(&mut record[5..]).await.is_err() {
                    return;
                }
                let _ = tx.send(record.clone());

                let Ok(mut outbound) = TcpStream::connect(target).await else {
                    return;
                };
                if outbound.write_all(&record).await.is_ok() {
                    let _ = tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await;
                }
            });
        }
    });

    (addr, rx)
}

/// Start the proxy on a free port with a freshly generated authority.
pub async fn start_proxy() -> ServerHandle {
    start_proxy_with(ServerConfig::default()).await
}

pub async fn start_proxy_with(config: ServerConfig) -> ServerHandle {
    HttpServer::new(config)
        .start("127.0.0.1:0", &EphemeralAuthority::new())
        .await
        .expect("proxy should start")
}

/// HTTP client standing in for the calling tool.
pub fn caller() -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

pub fn proxy_url(handle: &ServerHandle, path: &str) -> String {
    format!("https://{}{}", handle.local_addr(), path)
}

/// Configuration header pointing at a plain-HTTP upstream.
pub fn http_config(upstream: SocketAddr) -> String {
    format!(r#"{{"Host":"{upstream}","Scheme":"http"}}"#)
}

pub mod client_hello {
    //! Minimal ClientHello builder for raw capture tests.

    pub fn extension(ext_type: u16, body: &[u8]) -> Vec<u8> {
        let mut out = ext_type.to_be_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u16).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    pub fn u16_list(values: &[u16]) -> Vec<u8> {
        let mut out = ((values.len() * 2) as u16).to_be_bytes().to_vec();
        for v in values {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }

    pub fn alpn(protocols: &[&str]) -> Vec<u8> {
        let mut list = Vec::new();
        for p in protocols {
            list.push(p.len() as u8);
            list.extend_from_slice(p.as_bytes());
        }
        let mut body = (list.len() as u16).to_be_bytes().to_vec();
        body.extend_from_slice(&list);
        extension(0x0010, &body)
    }

    pub fn supported_versions(versions: &[u16]) -> Vec<u8> {
        let mut body = vec![(versions.len() * 2) as u8];
        for v in versions {
            body.extend_from_slice(&v.to_be_bytes());
        }
        extension(0x002b, &body)
    }

    /// A TLS record carrying a ClientHello with the given suites and ALPN.
    pub fn record(ciphers: &[u16], alpn_protocols: &[&str]) -> Vec<u8> {
        let extensions = [
            extension(0x000a, &u16_list(&[0x001d, 0x0017])),
            extension(0x000b, &[1, 0]),
            extension(0x000d, &u16_list(&[0x0403, 0x0804, 0x0401])),
            alpn(alpn_protocols),
            supported_versions(&[0x0304, 0x0303]),
        ]
        .concat();

        let mut body = vec![0x03, 0x03];
        body.extend_from_slice(&[0x42; 32]);
        body.push(0);
        body.extend_from_slice(&u16_list(ciphers));
        body.extend_from_slice(&[1, 0]);
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend_from_slice(&extensions);

        let mut handshake = vec![0x01];
        handshake.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        handshake.extend_from_slice(&body);

        let mut record = vec![0x16, 0x03, 0x01];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);
        record
    }

    /// Body of extension `ext_type` in a ClientHello record, if present.
    pub fn extension_body(record: &[u8], ext_type: u16) -> Option<Vec<u8>> {
        let u16_at = |pos: usize| -> Option<usize> {
            Some(u16::from_be_bytes([*record.get(pos)?, *record.get(pos + 1)?]) as usize)
        };

        // record header, handshake header, legacy version, random
        let mut pos = 5 + 4 + 2 + 32;
        pos += 1 + *record.get(pos)? as usize;
        pos += 2 + u16_at(pos)?;
        pos += 1 + *record.get(pos)? as usize;
        let end = pos + 2 + u16_at(pos)?;
        pos += 2;

        while pos + 4 <= end {
            let kind = u16_at(pos)? as u16;
            let len = u16_at(pos + 2)?;
            let body = record.get(pos + 4..pos + 4 + len)?;
            if kind == ext_type {
                return Some(body.to_vec());
            }
            pos += 4 + len;
        }
        None
    }
}
