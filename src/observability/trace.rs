//! Diagnostic traces of proxied traffic.
//!
//! A [`TraceEvent`] is built only through a [`Redactor`], so it never holds a
//! raw credential. Each event renders to one multi-line string and is handed
//! to a [`TraceSink`] as a unit; concurrent exchanges may interleave events
//! but never the lines within one event.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{Method, StatusCode};

use crate::http::request::InboundRequest;
use crate::net::{ConnectionId, ExchangeId};
use crate::redaction::{BodyView, Redactor};
use crate::upstream::{TransportError, TransportErrorKind, UpstreamResponse};

/// `tracing` target used for trace output.
pub const TRACE_TARGET: &str = "api_trace_proxy::trace";

/// Which connection and exchange an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub connection: ConnectionId,
    pub exchange: ExchangeId,
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.connection, self.exchange)
    }
}

/// Redacted view of one inbound request.
#[derive(Debug, Clone)]
pub struct InboundTrace {
    pub context: TraceContext,
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<BodyView>,
}

/// How an exchange ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Upstream answered; relayed as-is.
    Response {
        status: StatusCode,
        headers: Vec<(String, String)>,
        body: BodyView,
    },
    /// Upstream could not be reached or read; a 502 was synthesized.
    Failure {
        kind: TransportErrorKind,
        cause: String,
        upstream_status: Option<StatusCode>,
        partial_body: Option<BodyView>,
    },
}

/// Redacted view of one upstream outcome.
#[derive(Debug, Clone)]
pub struct OutboundTrace {
    pub context: TraceContext,
    pub elapsed: Duration,
    pub outcome: Outcome,
}

/// A single write-once diagnostic record.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    Inbound(InboundTrace),
    Outbound(OutboundTrace),
}

impl TraceEvent {
    pub fn inbound(
        context: TraceContext,
        request: &InboundRequest,
        url: &str,
        redactor: &Redactor,
    ) -> Self {
        TraceEvent::Inbound(InboundTrace {
            context,
            method: request.method.clone(),
            url: url.to_string(),
            headers: redactor.redact_headers(&request.headers),
            body: request
                .body
                .as_ref()
                .map(|body| redactor.redact_body(body, redactor.request_budget())),
        })
    }

    pub fn response(
        context: TraceContext,
        response: &UpstreamResponse,
        elapsed: Duration,
        redactor: &Redactor,
    ) -> Self {
        TraceEvent::Outbound(OutboundTrace {
            context,
            elapsed,
            outcome: Outcome::Response {
                status: response.status,
                headers: redactor.redact_headers(&response.headers),
                body: redactor.redact_body(&response.body, redactor.response_budget()),
            },
        })
    }

    pub fn failure(
        context: TraceContext,
        error: &TransportError,
        elapsed: Duration,
        redactor: &Redactor,
    ) -> Self {
        TraceEvent::Outbound(OutboundTrace {
            context,
            elapsed,
            outcome: Outcome::Failure {
                kind: error.kind,
                cause: error.root_cause(),
                upstream_status: error.status,
                partial_body: error
                    .partial_body
                    .as_ref()
                    .map(|body| redactor.redact_body(body, redactor.response_budget())),
            },
        })
    }

    pub fn context(&self) -> TraceContext {
        match self {
            TraceEvent::Inbound(trace) => trace.context,
            TraceEvent::Outbound(trace) => trace.context,
        }
    }

    pub fn is_inbound(&self) -> bool {
        matches!(self, TraceEvent::Inbound(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TraceEvent::Outbound(OutboundTrace {
                outcome: Outcome::Failure { .. },
                ..
            })
        )
    }
}

fn write_headers(f: &mut fmt::Formatter<'_>, headers: &[(String, String)]) -> fmt::Result {
    for (name, value) in headers {
        write!(f, "\n    {name}: {value}")?;
    }
    Ok(())
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &BodyView) -> fmt::Result {
    for line in body.to_string().lines() {
        write!(f, "\n    {line}")?;
    }
    Ok(())
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Inbound(trace) => {
                write!(f, ">>> {} {} {}", trace.context, trace.method, trace.url)?;
                write_headers(f, &trace.headers)?;
                if let Some(body) = &trace.body {
                    write_body(f, body)?;
                }
                Ok(())
            }
            TraceEvent::Outbound(trace) => {
                let millis = trace.elapsed.as_millis();
                match &trace.outcome {
                    Outcome::Response {
                        status,
                        headers,
                        body,
                    } => {
                        write!(f, "<<< {} {} ({} ms)", trace.context, status, millis)?;
                        write_headers(f, headers)?;
                        write_body(f, body)
                    }
                    Outcome::Failure {
                        kind,
                        cause,
                        upstream_status,
                        partial_body,
                    } => {
                        write!(
                            f,
                            "<<< {} {} ({} ms) upstream {} error: {}",
                            trace.context,
                            StatusCode::BAD_GATEWAY,
                            millis,
                            kind,
                            cause
                        )?;
                        if let Some(status) = upstream_status {
                            write!(f, "\n    Upstream status: {status}")?;
                        }
                        if let Some(body) = partial_body {
                            write!(f, "\n    Partial response:")?;
                            write_body(f, body)?;
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}

/// Destination for trace events. Shared by all concurrently running handlers.
pub trait TraceSink: Send + Sync {
    fn emit(&self, event: TraceEvent);
}

/// Writes each trace as one `tracing` event at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn emit(&self, event: TraceEvent) {
        let context = event.context();
        tracing::info!(
            target: TRACE_TARGET,
            connection_id = %context.connection,
            exchange_id = %context.exchange,
            "{event}"
        );
    }
}

/// Collects events in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Events for a single exchange, in emission order.
    pub fn for_exchange(&self, exchange: ExchangeId) -> Vec<TraceEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.context().exchange == exchange)
            .collect()
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, event: TraceEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
