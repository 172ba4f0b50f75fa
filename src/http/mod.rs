//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, GET/POST dispatch)
//!     → handler.rs (per-exchange state machine)
//!         → request.rs (buffer inbound, derive outbound)
//!         → upstream::Forwarder
//!     → response.rs (relay verbatim or synthesize error)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{Phase, ProxyHandler};
pub use request::{ClientReadError, InboundRequest, OutboundRequest, TargetError};
pub use server::{ProxyServer, ProxyState};
