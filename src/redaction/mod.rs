//! Redaction of secrets in diagnostic output.
//!
//! # Data Flow
//! ```text
//! InboundRequest / UpstreamResponse
//!     → header.rs (mask auth-like header values)
//!     → body.rs (JSON pretty-print or raw prefix, masked secret fields)
//!     → TraceEvent (observability/trace.rs)
//! ```
//!
//! Redaction is pure: nothing here performs I/O or touches the bytes that
//! are relayed on the wire.

pub mod body;
pub mod header;

use axum::http::HeaderMap;

use crate::config::{BodyBudget, RedactionConfig};

pub use body::BodyView;
pub use header::display_name;

/// Applies a [`RedactionConfig`] to header values and bodies.
#[derive(Debug, Clone)]
pub struct Redactor {
    policy: RedactionConfig,
    /// Lowercased copy of `policy.secret_markers`.
    markers: Vec<String>,
}

impl Redactor {
    pub fn new(policy: RedactionConfig) -> Self {
        let markers = policy
            .secret_markers
            .iter()
            .map(|m| m.to_ascii_lowercase())
            .collect();
        Self { policy, markers }
    }

    /// Display value for one header.
    pub fn redact(&self, header_name: &str, header_value: &str) -> String {
        if header::contains_marker(header_name, &self.markers) {
            header::mask_value(header_value, &self.policy)
        } else {
            header_value.to_string()
        }
    }

    /// Display pairs for a whole header map.
    pub fn redact_headers(&self, headers: &HeaderMap) -> Vec<(String, String)> {
        header::redact_map(headers, |name, value| self.redact(name, value))
    }

    /// Display view of a body under an explicit budget.
    pub fn redact_body(&self, bytes: &[u8], budget: BodyBudget) -> BodyView {
        body::render(bytes, budget, &self.policy, &self.markers)
    }

    /// Budget for inbound request bodies.
    pub fn request_budget(&self) -> BodyBudget {
        self.policy.request_body
    }

    /// Budget for upstream response bodies.
    pub fn response_budget(&self) -> BodyBudget {
        self.policy.response_body
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}
