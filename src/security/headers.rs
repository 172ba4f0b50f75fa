//! Header sanitization for outbound requests.
//!
//! # Responsibilities
//! - Strip proxy-only headers (`Host`, `Proxy-Connection`, `Proxy-Authorization`)
//! - Strip hop-by-hop and framing headers; the buffered body is re-framed upstream
//! - Leave every other header, including `Authorization`, untouched
//!
//! Response headers lose only hop-by-hop and framing headers: the relayed body
//! is already buffered and is re-framed for the client connection.

use axum::http::{HeaderMap, HeaderName};

/// Headers that address the proxy itself and must never reach upstream.
pub const PROXY_ONLY_HEADERS: &[&str] = &["host", "proxy-connection", "proxy-authorization"];

/// Connection-scoped headers that do not survive a hop.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "upgrade",
    "transfer-encoding",
    "content-length",
];

/// Returns true if `name` is dropped from outbound requests.
pub fn is_stripped(name: &HeaderName) -> bool {
    let name = name.as_str();
    PROXY_ONLY_HEADERS.contains(&name) || HOP_BY_HOP_HEADERS.contains(&name)
}

/// Copy of `inbound` without stripped headers. Repeated values are preserved.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if !is_stripped(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Copy of an upstream response's headers for the client reply.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
