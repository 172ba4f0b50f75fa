//! Replies written back to the client.
//!
//! # Responsibilities
//! - Relay an upstream response verbatim (status, end-to-end headers, body bytes)
//! - Synthesize 502 for transport failures
//! - Map client read failures to 400/413
//!
//! Redaction never applies here; it only affects trace output.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::ClientReadError;
use crate::security::headers::relay_headers;
use crate::upstream::{TransportError, UpstreamResponse};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Client reply carrying the upstream status, end-to-end headers and body.
///
/// Framing headers are dropped; hyper frames the buffered body itself.
pub fn relay(upstream: UpstreamResponse) -> Response {
    let mut reply = Response::new(Body::from(upstream.body));
    *reply.status_mut() = upstream.status;
    *reply.headers_mut() = relay_headers(&upstream.headers);
    reply
}

/// Synthesized reply for a transport failure.
pub fn bad_gateway(error: &TransportError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, TEXT_PLAIN)],
        error.diagnostic(),
    )
        .into_response()
}

impl ClientReadError {
    pub fn status(&self) -> StatusCode {
        match self {
            ClientReadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ClientReadError::Body(_) | ClientReadError::Target(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ClientReadError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, TEXT_PLAIN)],
            format!("{self}\n"),
        )
            .into_response()
    }
}
