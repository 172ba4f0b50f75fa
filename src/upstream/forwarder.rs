//! Issues outbound requests to the real upstream.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};

use crate::config::UpstreamConfig;
use crate::http::request::OutboundRequest;
use crate::upstream::error::TransportError;

/// A fully buffered upstream response. Any status, including 4xx/5xx.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HTTP client wrapper that forwards one request at a time per call.
///
/// The inner client pools connections and is shared across exchanges; it
/// holds no per-exchange state.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            // Never route through HTTP(S)_PROXY; that could be this process.
            .no_proxy()
            // 3xx is relayed to the client, not followed.
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self { client })
    }

    /// Send `request` and buffer the whole response within `timeout`.
    pub async fn forward(
        &self,
        request: OutboundRequest,
        timeout: Duration,
    ) -> Result<UpstreamResponse, TransportError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        tracing::debug!(method = %method, url = %url, "Forwarding upstream");

        let mut builder = self
            .client
            .request(method, url.clone())
            .headers(headers)
            .timeout(timeout);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let mut response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(url.clone(), None, None, e))?;

        let status = response.status();
        let headers = response.headers().clone();

        let mut buffered = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => buffered.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    return Err(TransportError::new(
                        url,
                        Some(status),
                        Some(Bytes::from(buffered)),
                        e,
                    ));
                }
            }
        }

        Ok(UpstreamResponse {
            status,
            headers,
            body: Bytes::from(buffered),
        })
    }
}
