//! Local TLS frontend.
//!
//! # Responsibilities
//! - Terminate TLS from the calling tool with the authority's certificate
//! - Strip the configuration header before anything else reads the request
//! - Run parse → resolve → build → forward under the request deadline
//! - Turn every per-request failure into the 500 error response
//! - Caller-owned lifecycle: `start` returns a [`ServerHandle`], `stop`
//!   drains in-flight requests
//!
//! # Design Decisions
//! - Nothing is shared between requests except the read-only registry
//! - Start is fatal on bind failure; per-request errors never stop the server

use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::map_request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::Handle;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ServerConfig, TransportConfig};
use crate::error::{FrontendError, ProxyError};
use crate::fingerprint::{resolve, FingerprintRegistry};
use crate::http::client::OutboundClient;
use crate::http::forward::forward;
use crate::net::authority::CertificateAuthorityProvider;
use crate::net::listener::Listener;
use crate::net::tls::server_config;
use crate::observability::metrics;
use crate::resilience::with_deadline;

/// Name of the header carrying the per-request transport configuration.
///
/// The calling tool can only emit one leading capital; matching is
/// case-insensitive anyway.
pub const CONFIGURATION_HEADER: &str = "Awesometlsconfig";

static CONFIGURATION_HEADER_NAME: HeaderName = HeaderName::from_static("awesometlsconfig");

/// Configuration header value, moved out of the headers into the request
/// extensions before any layer sees the request.
#[derive(Debug, Clone, Default)]
pub struct RawConfiguration(pub String);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: &'static FingerprintRegistry,
    pub request_timeout_secs: u64,
}

/// The local TLS frontend, not yet listening.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState {
            registry: FingerprintRegistry::global(),
            request_timeout_secs: config.timeouts.request_secs,
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(map_request(strip_configuration))
    }

    /// Bind `address`, terminate TLS with the authority's identity and serve
    /// in a background task.
    pub async fn start(
        self,
        address: &str,
        authority: &dyn CertificateAuthorityProvider,
    ) -> Result<ServerHandle, FrontendError> {
        let identity = authority.provide()?;
        let tls = server_config(identity)?;
        let listener = Listener::bind(address)?;
        let local_addr = listener.local_addr();

        let handle = Handle::new();
        let server = axum_server::from_tcp_rustls(listener.into_inner(), tls).handle(handle.clone());
        let app = self.router.into_make_service();
        let task = tokio::spawn(async move { server.serve(app).await });

        tracing::info!(
            address = %local_addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        Ok(ServerHandle {
            local_addr,
            handle,
            task,
        })
    }
}

/// A running frontend owned by its caller.
pub struct ServerHandle {
    local_addr: SocketAddr,
    handle: Handle,
    task: JoinHandle<io::Result<()>>,
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wait for every in-flight request to finish.
    pub async fn stop(self) -> Result<(), FrontendError> {
        tracing::info!(
            address = %self.local_addr,
            in_flight = self.handle.connection_count(),
            "Draining HTTP server"
        );
        self.handle.graceful_shutdown(None);

        self.task
            .await
            .map_err(|e| FrontendError::Serve(io::Error::other(e)))?
            .map_err(FrontendError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Remove the configuration header and return its first value ("" if absent).
pub fn take_configuration(headers: &mut HeaderMap) -> String {
    headers
        .remove(&CONFIGURATION_HEADER_NAME)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default()
}

async fn strip_configuration(mut request: Request<Body>) -> Request<Body> {
    let raw = take_configuration(request.headers_mut());
    request.extensions_mut().insert(RawConfiguration(raw));
    request
}

async fn proxy_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let RawConfiguration(raw_config) = request
        .extensions_mut()
        .remove::<RawConfiguration>()
        .unwrap_or_default();

    let span = tracing::info_span!(
        "relay",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        host = tracing::field::Empty,
        scheme = tracing::field::Empty,
        fingerprint = tracing::field::Empty,
    );

    let mut source = String::from("none");
    let result = with_deadline(
        state.request_timeout_secs,
        relay(request, raw_config, state.registry, &mut source),
    )
    .instrument(span.clone())
    .await;

    match result {
        Ok(response) => {
            span.in_scope(|| {
                tracing::info!(
                    status = response.status().as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Relayed"
                )
            });
            metrics::record_request("relayed", &source, start);
            response
        }
        Err(err) => {
            span.in_scope(|| tracing::error!(error = %err, "Request failed"));
            metrics::record_request(err.kind(), &source, start);
            err.into_response()
        }
    }
}

async fn relay(
    request: Request<Body>,
    raw_config: String,
    registry: &'static FingerprintRegistry,
    source_label: &mut String,
) -> Result<Response, ProxyError> {
    let config = TransportConfig::parse(&raw_config)?;
    let span = tracing::Span::current();
    span.record("host", config.host.as_str());
    span.record("scheme", tracing::field::display(config.scheme));

    let source = resolve(&config, registry)?;
    *source_label = source.label().to_string();
    span.record("fingerprint", source.label());

    let client = OutboundClient::build(&config, &source)?;
    Ok(forward(request, &config, &client).await?)
}
