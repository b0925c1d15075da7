//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http + relay produce:
//!     → logging.rs (structured tracing events, request spans)
//!     → metrics.rs (session counters, byte totals, durations)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace span of every request
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
