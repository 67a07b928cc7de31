//! Fingerprinted TLS to an HTTPS upstream with a self-signed certificate.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::sync::mpsc::UnboundedReceiver;

use awesome_tls_proxy::fingerprint::registry::is_grease;
use awesome_tls_proxy::fingerprint::CustomClientHelloSpec;
use awesome_tls_proxy::http::CONFIGURATION_HEADER;
use awesome_tls_proxy::net::tls::server_config;
use awesome_tls_proxy::net::{CertificateAuthorityProvider, EphemeralAuthority, Listener};

mod common;

use common::{caller, proxy_url, start_hello_tap, start_proxy};

const EXT_SESSION_TICKET: u16 = 0x0023;
const EXT_PRE_SHARED_KEY: u16 = 0x0029;

/// TLS upstream preferring h2, answering `<version> <path>` for every request.
async fn start_tls_backend() -> SocketAddr {
    let identity = EphemeralAuthority::new().provide().unwrap();
    let mut rustls_config = (*server_config(identity).unwrap().get_inner()).clone();
    rustls_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    let tls = RustlsConfig::from_config(Arc::new(rustls_config));
    let listener = Listener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr();

    let app = Router::new().fallback(|request: Request<Body>| async move {
        format!("{:?} {}", request.version(), request.uri().path())
    });

    tokio::spawn(async move {
        let _ = axum_server::from_tcp_rustls(listener.into_inner(), tls)
            .serve(app.into_make_service())
            .await;
    });
    addr
}

/// Wait for the next ClientHello recorded by the tap.
async fn next_hello(hellos: &mut UnboundedReceiver<Vec<u8>>) -> (Vec<u8>, CustomClientHelloSpec) {
    let record = tokio::time::timeout(Duration::from_secs(10), hellos.recv())
        .await
        .expect("no ClientHello reached the upstream")
        .expect("tap stopped");
    let hello = CustomClientHelloSpec::parse(&record).expect("proxy sent an unparsable ClientHello");
    (record, hello)
}

fn tls12_suites(hello: &CustomClientHelloSpec) -> Vec<u16> {
    hello
        .cipher_suites
        .iter()
        .copied()
        .filter(|&c| !is_grease(c) && !(0x1301..=0x1305).contains(&c))
        .collect()
}

fn real_groups(hello: &CustomClientHelloSpec) -> Vec<u16> {
    hello.supported_groups.iter().copied().filter(|&g| !is_grease(g)).collect()
}

async fn relay_through(upstream: SocketAddr, fingerprint_fields: &str, path: &str) -> String {
    let proxy = start_proxy().await;
    let config = format!(r#"{{"Host":"{upstream}","Scheme":"https",{fingerprint_fields}}}"#);
    let res = caller()
        .get(proxy_url(&proxy, path))
        .header(CONFIGURATION_HEADER, config)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    proxy.stop().await.unwrap();
    body
}

#[tokio::test]
async fn test_firefox_profile_shapes_the_client_hello() {
    let (upstream, mut hellos) = start_hello_tap(start_tls_backend().await).await;

    let body = relay_through(upstream, r#""Fingerprint":"Firefox 117""#, "/ff").await;
    assert_eq!(body, "HTTP/2.0 /ff");

    let (_, hello) = next_hello(&mut hellos).await;
    assert_eq!(
        tls12_suites(&hello),
        vec![
            0xc02b, 0xc02f, 0xcca9, 0xcca8, 0xc02c, 0xc030, 0xc00a, 0xc009, 0xc013, 0xc014,
            0x009c, 0x009d, 0x002f, 0x0035,
        ]
    );
    assert_eq!(real_groups(&hello), vec![0x001d, 0x0017, 0x0018, 0x0019]);
    assert_eq!(hello.alpn, vec!["h2".to_string(), "http/1.1".to_string()]);
    assert!(!hello.grease, "Firefox does not GREASE");
    assert!(hello.supported_versions.contains(&0x0304));
}

#[tokio::test]
async fn test_chrome_profile_carries_grease() {
    let (upstream, mut hellos) = start_hello_tap(start_tls_backend().await).await;

    relay_through(upstream, r#""Fingerprint":"Chrome 120""#, "/").await;

    let (_, hello) = next_hello(&mut hellos).await;
    assert!(hello.grease);
    assert_eq!(
        tls12_suites(&hello),
        vec![0xc02b, 0xc02f, 0xc02c, 0xc030, 0xcca9, 0xcca8, 0xc013, 0xc014, 0x009c, 0x009d, 0x002f, 0x0035]
    );
    assert_eq!(real_groups(&hello), vec![0x001d, 0x0017, 0x0018]);
}

#[tokio::test]
async fn test_raw_capture_shapes_the_client_hello() {
    let (upstream, mut hellos) = start_hello_tap(start_tls_backend().await).await;

    let capture = common::client_hello::record(&[0x1301, 0xc02f, 0xc02b, 0x009c], &["http/1.1"]);
    let fields = format!(r#""Fingerprint":"Chrome 120","HexClientHello":"{}""#, hex::encode(capture));
    let body = relay_through(upstream, &fields, "/captured").await;
    assert_eq!(body, "HTTP/1.1 /captured");

    let (_, hello) = next_hello(&mut hellos).await;
    assert_eq!(tls12_suites(&hello), vec![0xc02f, 0xc02b, 0x009c]);
    assert_eq!(hello.alpn, vec!["http/1.1".to_string()]);
    assert_eq!(real_groups(&hello), vec![0x001d, 0x0017]);
    assert!(!hello.grease);
    assert!(!hello.has_extension(0x0000), "capture had no SNI");
}

#[tokio::test]
async fn test_no_session_state_crosses_requests() {
    let (upstream, mut hellos) = start_hello_tap(start_tls_backend().await).await;
    let proxy = start_proxy().await;
    let config = format!(r#"{{"Host":"{upstream}","Scheme":"https","Fingerprint":"Chrome 120"}}"#);

    for path in ["/first", "/second"] {
        let res = caller()
            .get(proxy_url(&proxy, path))
            .header(CONFIGURATION_HEADER, &config)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }
    proxy.stop().await.unwrap();

    let (_, first) = next_hello(&mut hellos).await;
    let (record, second) = next_hello(&mut hellos).await;
    assert!(first.has_extension(EXT_SESSION_TICKET));
    assert!(!second.has_extension(EXT_PRE_SHARED_KEY));
    let ticket = common::client_hello::extension_body(&record, EXT_SESSION_TICKET);
    assert_eq!(ticket, Some(Vec::new()), "second hello resumed a session");
}

#[tokio::test]
async fn test_named_profile_reaches_unverified_upstream() {
    let upstream = start_tls_backend().await;
    let proxy = start_proxy().await;

    let config = format!(r#"{{"Host":"{upstream}","Scheme":"https","Fingerprint":"Chrome 120"}}"#);
    let res = caller()
        .get(proxy_url(&proxy, "/tls-check"))
        .header(CONFIGURATION_HEADER, config)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    assert!(body.ends_with(" /tls-check"), "{body}");

    proxy.stop().await.unwrap();
}

#[tokio::test]
async fn test_default_profile_negotiates_h2() {
    let upstream = start_tls_backend().await;
    let proxy = start_proxy().await;

    let config = format!(r#"{{"Host":"{upstream}","Scheme":"https","Fingerprint":"Default"}}"#);
    let res = caller()
        .get(proxy_url(&proxy, "/"))
        .header(CONFIGURATION_HEADER, config)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "HTTP/2.0 /");

    proxy.stop().await.unwrap();
}

#[tokio::test]
async fn test_raw_capture_alpn_is_honoured() {
    let upstream = start_tls_backend().await;
    let proxy = start_proxy().await;

    let hello = common::client_hello::record(&[0x1301, 0xc02b, 0xc02f], &["http/1.1"]);
    let config = format!(
        r#"{{"Host":"{upstream}","Scheme":"https","Fingerprint":"Chrome 120","HexClientHello":"{}"}}"#,
        hex::encode(hello)
    );
    let res = caller()
        .get(proxy_url(&proxy, "/raw"))
        .header(CONFIGURATION_HEADER, config)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "HTTP/1.1 /raw");

    proxy.stop().await.unwrap();
}
