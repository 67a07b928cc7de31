//! Error responses written back to the calling tool.
//!
//! Every per-request failure becomes `500 Internal Server Error` with a
//! plain-text body `Awesome TLS error: <reason>`; the calling tool shows the
//! body verbatim to its user.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            self.body(),
        )
            .into_response()
    }
}
