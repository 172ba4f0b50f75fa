//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → headers.rs (strip proxy-only and hop-by-hop headers)
//!     → OutboundRequest
//!
//! UpstreamResponse
//!     → headers.rs (strip hop-by-hop and framing headers)
//!     → client reply
//! ```
//!
//! Secrets in the forwarded traffic are left intact; masking for display
//! lives in `redaction`.

pub mod headers;
