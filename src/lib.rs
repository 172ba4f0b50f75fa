//! Local forward proxy that relays HTTP API traffic and prints
//! secret-redacted traces of every request/response pair.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod redaction;
pub mod security;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
pub use redaction::Redactor;
