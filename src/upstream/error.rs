//! Transport-level failures reaching upstream.
//!
//! An HTTP error status from upstream is *not* a transport error; it is a
//! normal [`UpstreamResponse`](super::UpstreamResponse) relayed verbatim.

use std::error::Error as _;
use std::fmt;

use axum::body::Bytes;
use axum::http::StatusCode;
use url::Url;

/// What part of the upstream exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS resolution, connection refused/reset, TLS handshake.
    Connect,
    /// The exchange exceeded its deadline.
    Timeout,
    /// The response body could not be read to completion.
    Body,
    /// Any other failure building or sending the request.
    Request,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Request => "request",
        }
    }

    fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to establish or complete the upstream exchange.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error reaching {url}: {source}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: Url,
    /// Status line, if headers arrived before the failure.
    pub status: Option<StatusCode>,
    /// Body bytes received before the failure, if any.
    pub partial_body: Option<Bytes>,
    #[source]
    pub source: reqwest::Error,
}

impl TransportError {
    pub(crate) fn new(
        url: Url,
        status: Option<StatusCode>,
        partial_body: Option<Bytes>,
        source: reqwest::Error,
    ) -> Self {
        Self {
            kind: TransportErrorKind::classify(&source),
            url,
            status,
            partial_body: partial_body.filter(|b| !b.is_empty()),
            source,
        }
    }

    /// Innermost cause, e.g. "Connection refused (os error 111)".
    pub fn root_cause(&self) -> String {
        let mut cause: &dyn std::error::Error = &self.source;
        while let Some(next) = cause.source() {
            cause = next;
        }
        cause.to_string()
    }

    /// Short plain-text body for the synthesized 502 reply.
    pub fn diagnostic(&self) -> String {
        let host = self.url.host_str().unwrap_or("upstream");
        format!(
            "Bad Gateway: {} error reaching {}: {}\n",
            self.kind,
            host,
            self.root_cause()
        )
    }
}
