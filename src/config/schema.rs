//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the tracing proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (loopback bind address).
    pub listener: ListenerConfig,

    /// Where and how requests are forwarded.
    pub upstream: UpstreamConfig,

    /// Masking thresholds and body budgets for trace output.
    pub redaction: RedactionConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address. Must be a loopback address (e.g., "127.0.0.1:8899").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8899".to_string(),
        }
    }
}

/// Upstream resolution and forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host used when the inbound request carries no `Host` header.
    pub default_host: String,

    /// Scheme used for origin-form request targets ("https" or "http").
    pub scheme: String,

    /// Total time allowed for one upstream exchange, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            default_host: "api.githubcopilot.com".to_string(),
            scheme: "https".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Redaction policy for trace output.
///
/// Only affects what is printed. Relayed traffic is never touched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Case-insensitive substrings marking a header name or JSON key as secret.
    pub secret_markers: Vec<String>,

    /// Values with at most this many characters are shown unmodified.
    pub min_masked_len: usize,

    /// Leading characters kept visible in a masked value.
    pub visible_prefix: usize,

    /// Trailing characters kept visible in a masked value.
    pub visible_suffix: usize,

    /// Marker placed between the visible prefix and suffix.
    pub ellipsis: String,

    /// Budget for inbound request bodies.
    pub request_body: BodyBudget,

    /// Budget for upstream response bodies.
    pub response_body: BodyBudget,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            secret_markers: vec!["auth".to_string()],
            min_masked_len: 20,
            visible_prefix: 25,
            visible_suffix: 5,
            ellipsis: "...".to_string(),
            request_body: BodyBudget::new(500, 200),
            response_body: BodyBudget::new(2000, 500),
        }
    }
}

/// Truncation budget for one body view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BodyBudget {
    /// Maximum characters of pretty-printed JSON.
    pub structured: usize,

    /// Maximum raw bytes shown when the body is not JSON.
    pub raw: usize,
}

impl BodyBudget {
    pub const fn new(structured: usize, raw: usize) -> Self {
        Self { structured, raw }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9899".to_string(),
        }
    }
}
