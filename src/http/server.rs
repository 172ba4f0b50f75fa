//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router dispatching GET and POST to the proxy handler
//! - Wire up middleware (HTTP spans)
//! - Serve connections from the loopback listener, one task each
//! - Stop accepting on shutdown and drain in-flight exchanges

use std::sync::Arc;

use axum::routing::{get, MethodRouter};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, UpstreamConfig};
use crate::http::handler::proxy_exchange;
use crate::net::{ClientConnection, InFlightTracker, Listener};
use crate::observability::{LogSink, TraceSink};
use crate::redaction::Redactor;
use crate::upstream::Forwarder;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ProxyState {
    pub forwarder: Forwarder,
    pub redactor: Arc<Redactor>,
    pub sink: Arc<dyn TraceSink>,
    pub upstream: Arc<UpstreamConfig>,
    pub max_body_bytes: usize,
    pub in_flight: InFlightTracker,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig, sink: Arc<dyn TraceSink>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            forwarder: Forwarder::new(&config.upstream)?,
            redactor: Arc::new(Redactor::new(config.redaction.clone())),
            sink,
            upstream: Arc::new(config.upstream.clone()),
            max_body_bytes: config.limits.max_body_bytes,
            in_flight: InFlightTracker::new(),
        })
    }
}

/// HTTP server for the tracing proxy.
pub struct ProxyServer {
    router: Router,
    state: ProxyState,
}

impl ProxyServer {
    /// Create a server that writes traces to the log.
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Self::with_sink(config, Arc::new(LogSink))
    }

    /// Create a server that writes traces to `sink`.
    pub fn with_sink(config: &ProxyConfig, sink: Arc<dyn TraceSink>) -> Result<Self, reqwest::Error> {
        let state = ProxyState::new(config, sink)?;
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router. Methods other than GET/HEAD/POST get 405.
    fn build_router(state: ProxyState) -> Router {
        let exchange: MethodRouter<ProxyState> = get(proxy_exchange).post(proxy_exchange);
        Router::new()
            .route("/", exchange.clone())
            .route("/{*path}", exchange)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Router without a listener, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Number of exchanges currently being handled.
    pub fn in_flight(&self) -> InFlightTracker {
        self.state.in_flight.clone()
    }

    /// Serve until a shutdown message arrives, then drain in-flight exchanges.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr();
        tracing::info!(address = %addr, "Proxy accepting connections");

        let in_flight = self.state.in_flight.clone();
        let app = self
            .router
            .into_make_service_with_connect_info::<ClientConnection>();

        axum::serve(listener.into_inner(), app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!(
                    in_flight = in_flight.active_count(),
                    "Shutdown requested, draining in-flight exchanges"
                );
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
