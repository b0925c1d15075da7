//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve)
//!     → request.rs (x-request-id assigned and propagated)
//!     → server.rs (open the configured file, pipe it into a channel body)
//!     → response.rs (200 streaming body, or 500 "File not found.")
//!     → hyper drains the body at the client's pace
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::FILE_NOT_FOUND;
pub use server::HttpServer;
