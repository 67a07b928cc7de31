//! Request relay to the configured upstream.
//!
//! # Data Flow
//! ```text
//! Inbound request (config header already removed)
//!     → rewrite scheme + authority, keep path and query verbatim
//!     → OutboundClient (one attempt, no redirects)
//!     → buffer the whole upstream body
//!     → status + headers (minus Content-Length) + body back to the caller
//! ```

use std::error::Error as StdError;
use std::str::FromStr;

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::uri::{Authority, PathAndQuery, Scheme as UriScheme};
use axum::http::{HeaderMap, Request, Response, Uri, Version};

use crate::config::{Scheme, TransportConfig};
use crate::error::TransportError;
use crate::http::client::OutboundClient;

/// Build the upstream URI: target scheme and host, inbound path and query.
pub fn rewrite_uri(inbound: &Uri, config: &TransportConfig) -> Result<Uri, TransportError> {
    let authority = Authority::from_str(&config.host)
        .map_err(|e| TransportError::InvalidTarget(format!("{:?}: {e}", config.host)))?;
    let scheme = match config.scheme {
        Scheme::Http => UriScheme::HTTP,
        Scheme::Https => UriScheme::HTTPS,
    };
    let path_and_query = inbound
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| TransportError::InvalidTarget(e.to_string()))
}

/// Headers relayed back to the caller: everything except framing headers,
/// repeated values kept in order.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if name == CONTENT_LENGTH || name == TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Send `request` upstream through `client` and buffer the answer.
pub async fn forward(
    request: Request<Body>,
    config: &TransportConfig,
    client: &OutboundClient,
) -> Result<Response<Body>, TransportError> {
    let (mut parts, body) = request.into_parts();

    parts.uri = rewrite_uri(&parts.uri, config)?;
    parts.version = Version::HTTP_11;
    parts.headers.remove(HOST);
    parts.extensions.clear();

    tracing::debug!(method = %parts.method, uri = %parts.uri, "Forwarding upstream");

    let response = client
        .inner()
        .request(Request::from_parts(parts, body))
        .await
        .map_err(|e| TransportError::Upstream(describe(&e)))?;

    let (upstream, incoming) = response.into_parts();
    let bytes = axum::body::to_bytes(Body::new(incoming), usize::MAX)
        .await
        .map_err(|e| TransportError::BodyReadFailed(describe(&e)))?;

    let mut relayed = Response::new(Body::from(bytes));
    *relayed.status_mut() = upstream.status;
    *relayed.headers_mut() = relay_headers(&upstream.headers);
    Ok(relayed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(host: &str, scheme: Scheme) -> TransportConfig {
        TransportConfig {
            host: host.into(),
            scheme,
            fingerprint: String::new(),
            raw_client_hello: String::new(),
            dial_timeout_secs: 0,
            keep_alive_interval_secs: 0,
            idle_conn_timeout_secs: 0,
        }
    }

    #[test]
    fn path_and_query_survive_rewrite() {
        let inbound: Uri = "/status?x=1&y=%20z".parse().unwrap();
        let uri = rewrite_uri(&inbound, &config("example.com", Scheme::Https)).unwrap();
        assert_eq!(uri.to_string(), "https://example.com/status?x=1&y=%20z");
    }

    #[test]
    fn absolute_inbound_target_is_replaced() {
        let inbound: Uri = "https://127.0.0.1:8887/a/b?q".parse().unwrap();
        let uri = rewrite_uri(&inbound, &config("example.com:8443", Scheme::Http)).unwrap();
        assert_eq!(uri.to_string(), "http://example.com:8443/a/b?q");
    }

    #[test]
    fn empty_query_marker_is_kept() {
        let inbound: Uri = "/search?".parse().unwrap();
        let uri = rewrite_uri(&inbound, &config("example.com", Scheme::Https)).unwrap();
        assert_eq!(uri.path_and_query().map(|p| p.as_str()), Some("/search?"));
    }

    #[test]
    fn invalid_host_is_rejected() {
        let inbound: Uri = "/".parse().unwrap();
        let err = rewrite_uri(&inbound, &config("bad host/", Scheme::Https)).unwrap_err();
        assert!(matches!(err, TransportError::InvalidTarget(_)));
    }

    #[test]
    fn relay_drops_length_and_keeps_repeated_values() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        upstream.append("set-cookie", HeaderValue::from_static("a=1"));
        upstream.append("set-cookie", HeaderValue::from_static("b=2"));
        upstream.insert("x-upstream", HeaderValue::from_static("yes"));

        let relayed = relay_headers(&upstream);
        assert!(relayed.get(CONTENT_LENGTH).is_none());
        let cookies: Vec<_> = relayed.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(relayed.get("x-upstream").unwrap(), "yes");
    }
}
