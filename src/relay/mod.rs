//! Byte relay subsystem.
//!
//! # Data Flow
//! ```text
//! FileSource::open (fails early → SourceUnavailable, nothing sent yet)
//!     → RelaySession::run
//!         loop:
//!             sink.ready()      (suspends while the consumer is saturated)
//!             source.next()     (one chunk, never more than one in hand)
//!             sink.write(chunk)
//!         end-of-data → sink.finish()
//!         read error  → sink.abort()
//!     → source dropped on every exit path
//! ```
//!
//! # Design Decisions
//! - Readiness is awaited before every read, so a fast source can never
//!   run ahead of a slow consumer
//! - Source and sink are moved into the session; ownership makes the
//!   session single-use and releases the source exactly once
//! - `pipe` is the same loop spawned onto the runtime behind one call

pub mod error;
pub mod pipe;
pub mod session;
pub mod sink;
pub mod source;

pub use error::RelayError;
pub use pipe::pipe;
pub use session::{relay, RelayReport, RelaySession, SessionId};
pub use sink::{ChannelBody, ChannelSink, Sink, SinkClosed};
pub use source::{FileSource, Source};
