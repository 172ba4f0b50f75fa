//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler produces:
//!     → trace.rs (redacted inbound/outbound traffic traces)
//!     → metrics.rs (counters, histograms)
//!
//! Everything else logs through `tracing`, initialized by logging.rs.
//! ```
//!
//! # Design Decisions
//! - Traffic traces are human-readable text on their own `tracing` target
//! - One trace = one `tracing` event, so a trace's lines never interleave
//! - Metrics export is opt-in

pub mod logging;
pub mod metrics;
pub mod trace;

pub use trace::{LogSink, MemorySink, TraceContext, TraceEvent, TraceSink};
