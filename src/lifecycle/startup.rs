//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the optional metrics exporter
//! - Bind the listener last, then serve until shutdown
//!
//! Any startup error is fatal; nothing is accepted before all subsystems are up.

use tokio::sync::broadcast;

use crate::config::ProxyConfig;
use crate::http::ProxyServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// Fatal errors that end the process with a nonzero exit code.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Bind(#[from] ListenerError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the proxy until an interrupt signal, then drain and return.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    // Subscribe first so a signal arriving during startup is not lost.
    let receiver = shutdown.subscribe();
    let signal_task = signals::spawn_signal_listener(shutdown.clone());

    let result = serve(config, receiver).await;
    signal_task.abort();
    result
}

/// Bring the proxy up and serve until `shutdown` receives a message.
///
/// A message already queued on `shutdown` stops the server right after bind.
pub async fn serve(
    config: ProxyConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_default_host = %config.upstream.default_host,
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    let server = ProxyServer::new(&config)?;

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = Listener::bind(&config.listener).await?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ephemeral_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config
    }

    #[tokio::test]
    async fn shutdown_requested_during_startup_is_honored() {
        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        shutdown.trigger();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            serve(ephemeral_config(), receiver),
        )
        .await
        .expect("server ignored a shutdown sent before it was serving");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = ProxyConfig::default();
        config.listener.bind_address = taken.local_addr().unwrap().to_string();

        let shutdown = Shutdown::new();
        let result = serve(config, shutdown.subscribe()).await;
        assert!(matches!(result, Err(StartupError::Bind(_))));
    }
}
