//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (loopback bind, accept via axum::serve)
//!     → connection.rs (connection ID, peer address)
//!     → Hand off to HTTP layer (one task per connection)
//! ```
//!
//! # Design Decisions
//! - Loopback only: the proxy is a local diagnostic tool
//! - No queueing policy beyond the OS accept backlog
//! - Each exchange tracked so shutdown can drain in-flight work

pub mod connection;
pub mod listener;

pub use connection::{ClientConnection, ConnectionId, ExchangeId, InFlightTracker};
pub use listener::{Listener, ListenerError};
