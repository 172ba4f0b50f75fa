//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest
//!     → forwarder.rs (reqwest, bounded timeout, no redirects)
//!     → UpstreamResponse (any status)  |  TransportError (error.rs)
//! ```
//!
//! # Design Decisions
//! - 4xx/5xx are successful exchanges from the proxy's point of view
//! - Responses are fully buffered so traces and replies see the same bytes
//! - No retries: one outbound attempt per inbound request

pub mod error;
pub mod forwarder;

pub use error::{TransportError, TransportErrorKind};
pub use forwarder::{Forwarder, UpstreamResponse};
