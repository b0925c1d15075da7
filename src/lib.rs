//! Backpressure-aware file relay over HTTP.
//!
//! Serves one configured file to every request, streaming it through a
//! bounded relay so memory stays flat and the client's read rate paces
//! the file reads.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{pipe, relay, RelayError, RelayReport};
