//! Inbound request capture and outbound request derivation.
//!
//! # Responsibilities
//! - Buffer the client's request (method, target, headers, body)
//! - Resolve the absolute upstream URL for the request target
//! - Derive the outbound request with proxy-only headers stripped
//!
//! # Design Decisions
//! - Absolute-form targets (`GET http://host/path`) are used as-is
//! - Origin-form targets resolve against the `Host` header, else the default host
//! - The inbound request is kept intact for tracing; the outbound one is a copy

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, Uri};
use url::Url;

use crate::config::UpstreamConfig;
use crate::security::headers::outbound_headers;

/// Failure to turn the request target into an upstream URL.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("invalid upstream URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme `{0}` in request target")]
    UnsupportedScheme(String),
}

/// Failure while reading the request from the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientReadError {
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("request body of {declared} bytes exceeds the {limit} byte limit")]
    TooLarge { declared: u64, limit: usize },

    #[error(transparent)]
    Target(#[from] TargetError),
}

/// One request as received from the client.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Request target exactly as sent (origin-form or absolute-form).
    pub target: Uri,
    pub headers: HeaderMap,
    /// Present only for methods that carry a body.
    pub body: Option<Bytes>,
    /// `Host` header value, or the configured default host.
    pub host: String,
}

impl InboundRequest {
    /// Consume the client's request, buffering up to `max_body_bytes` of body.
    pub async fn read(
        request: Request<Body>,
        upstream: &UpstreamConfig,
        max_body_bytes: usize,
    ) -> Result<Self, ClientReadError> {
        let (parts, body) = request.into_parts();

        let body = if method_carries_body(&parts.method) {
            if let Some(declared) = declared_length(&parts.headers) {
                if declared > max_body_bytes as u64 {
                    return Err(ClientReadError::TooLarge {
                        declared,
                        limit: max_body_bytes,
                    });
                }
            }
            let bytes = axum::body::to_bytes(body, max_body_bytes)
                .await
                .map_err(ClientReadError::Body)?;
            Some(bytes)
        } else {
            None
        };

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(upstream.default_host.as_str())
            .to_string();

        Ok(Self {
            method: parts.method,
            target: parts.uri,
            headers: parts.headers,
            body,
            host,
        })
    }

    /// Absolute URL this request resolves to upstream.
    pub fn resolve_url(&self, scheme: &str) -> Result<Url, TargetError> {
        resolve_target(&self.target, &self.host, scheme)
    }

    /// Derive the request that is actually sent upstream.
    pub fn to_outbound(&self, upstream: &UpstreamConfig) -> Result<OutboundRequest, TargetError> {
        Ok(OutboundRequest {
            method: self.method.clone(),
            url: self.resolve_url(&upstream.scheme)?,
            headers: outbound_headers(&self.headers),
            body: self.body.clone(),
        })
    }
}

/// The request issued to the real upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Methods whose requests carry a body.
pub fn method_carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Resolve a request target to an absolute upstream URL.
pub fn resolve_target(target: &Uri, host: &str, scheme: &str) -> Result<Url, TargetError> {
    if let (Some(target_scheme), Some(_)) = (target.scheme_str(), target.authority()) {
        if target_scheme != "http" && target_scheme != "https" {
            return Err(TargetError::UnsupportedScheme(target_scheme.to_string()));
        }
        let url = target.to_string();
        return Url::parse(&url).map_err(|source| TargetError::InvalidUrl { url, source });
    }

    let path_and_query = target
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{scheme}://{host}{path_and_query}");
    Url::parse(&url).map_err(|source| TargetError::InvalidUrl { url, source })
}
