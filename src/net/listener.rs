//! Loopback TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured loopback address
//! - Refuse to expose the proxy on any other interface
//! - Report bind failures as a distinct, fatal error

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured address could not be parsed.
    InvalidAddress(String),
    /// The configured address is not a loopback address.
    NotLoopback(SocketAddr),
    /// Failed to bind (e.g. port already in use).
    Bind(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::InvalidAddress(addr) => write!(f, "Invalid bind address: {}", addr),
            ListenerError::NotLoopback(addr) => {
                write!(f, "Refusing to bind non-loopback address {}", addr)
            }
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind(e) => Some(e),
            _ => None,
        }
    }
}

/// A TCP listener bound to a loopback interface.
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to the configured loopback address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|_| ListenerError::InvalidAddress(config.bind_address.clone()))?;

        if !addr.ip().is_loopback() {
            return Err(ListenerError::NotLoopback(addr));
        }

        let inner = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = inner.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}
