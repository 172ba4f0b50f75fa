//! Per-exchange proxy handler.
//!
//! Each inbound request gets its own [`ProxyHandler`], which moves strictly
//! forward through three phases and never retries:
//!
//! ```text
//! Reading ──▶ Forwarding ──▶ Replying
//!   │  inbound trace ┘            │ outbound trace, then reply bytes
//!   └── read failure ─────────────┘ (400/413, no trace pair)
//! ```

use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::{ClientReadError, InboundRequest, OutboundRequest};
use crate::http::response::{bad_gateway, relay};
use crate::http::server::ProxyState;
use crate::net::connection::{ClientConnection, ConnectionId, ExchangeId, InFlightGuard};
use crate::observability::metrics;
use crate::observability::{TraceContext, TraceEvent};

/// Phase of a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Consuming request line, headers and body from the client.
    Reading,
    /// Waiting on the upstream call.
    Forwarding,
    /// Writing the relayed or synthesized reply.
    Replying,
}

/// Router entry point for every proxied method.
pub async fn proxy_exchange(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let connection = request
        .extensions()
        .get::<ConnectInfo<ClientConnection>>()
        .map(|ConnectInfo(conn)| conn.id)
        .unwrap_or_default();

    ProxyHandler::new(state, connection).handle(request).await
}

/// Handles one request/reply exchange.
pub struct ProxyHandler {
    state: ProxyState,
    context: TraceContext,
    phase: Phase,
    started: Instant,
    in_flight: Option<InFlightGuard>,
}

impl ProxyHandler {
    pub fn new(state: ProxyState, connection: ConnectionId) -> Self {
        let exchange = ExchangeId::new();
        let in_flight = state.in_flight.track(exchange);
        Self {
            state,
            context: TraceContext {
                connection,
                exchange,
            },
            phase: Phase::Reading,
            started: Instant::now(),
            in_flight: Some(in_flight),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "phases only move forward");
        tracing::trace!(
            exchange_id = %self.context.exchange,
            from = ?self.phase,
            to = ?next,
            "Phase transition"
        );
        self.phase = next;
    }

    /// Run the exchange to completion. Always produces exactly one reply.
    pub async fn handle(mut self, request: Request<Body>) -> Response {
        let method = request.method().to_string();

        let inbound = match InboundRequest::read(
            request,
            &self.state.upstream,
            self.state.max_body_bytes,
        )
        .await
        {
            Ok(inbound) => inbound,
            Err(e) => return self.reject(&method, e),
        };

        let outbound = match inbound.to_outbound(&self.state.upstream) {
            Ok(outbound) => outbound,
            Err(e) => return self.reject(&method, e.into()),
        };

        self.state.sink.emit(TraceEvent::inbound(
            self.context,
            &inbound,
            outbound.url.as_str(),
            &self.state.redactor,
        ));
        self.enter(Phase::Forwarding);

        // Detached from the connection future; survives a client hang-up.
        let exchange = tokio::spawn(forward_exchange(
            self.state.clone(),
            self.context,
            outbound,
            method.clone(),
            self.started,
            self.in_flight.take(),
        ));
        let reply = match exchange.await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    exchange_id = %self.context.exchange,
                    error = %e,
                    "Exchange task failed"
                );
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
        self.enter(Phase::Replying);
        reply
    }

    fn reject(mut self, method: &str, error: ClientReadError) -> Response {
        tracing::warn!(
            connection_id = %self.context.connection,
            exchange_id = %self.context.exchange,
            error = %error,
            "Rejecting unreadable request"
        );
        self.enter(Phase::Replying);
        let reply = error.into_response();
        metrics::record_exchange(method, reply.status().as_u16(), self.started);
        reply
    }
}

/// Forward upstream, emit the outbound trace and build the reply.
async fn forward_exchange(
    state: ProxyState,
    context: TraceContext,
    outbound: OutboundRequest,
    method: String,
    started: Instant,
    _in_flight: Option<InFlightGuard>,
) -> Response {
    let sent = Instant::now();
    let result = state
        .forwarder
        .forward(outbound, state.upstream.timeout())
        .await;

    match result {
        Ok(upstream) => {
            state.sink.emit(TraceEvent::response(
                context,
                &upstream,
                sent.elapsed(),
                &state.redactor,
            ));
            metrics::record_exchange(&method, upstream.status.as_u16(), started);
            relay(upstream)
        }
        Err(e) => {
            tracing::warn!(
                exchange_id = %context.exchange,
                kind = %e.kind,
                url = %e.url,
                error = %e.root_cause(),
                "Upstream transport failure"
            );
            state
                .sink
                .emit(TraceEvent::failure(context, &e, sent.elapsed(), &state.redactor));
            metrics::record_upstream_failure(e.kind);
            let reply = bad_gateway(&e);
            metrics::record_exchange(&method, reply.status().as_u16(), started);
            reply
        }
    }
}
