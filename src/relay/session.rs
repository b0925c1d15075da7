//! Relay session: one source, one sink, one transfer.
//!
//! # States
//! ```text
//! Streaming → Completed   source exhausted, sink finished
//! Streaming → Failed      read error (sink aborted) or sink closed
//! ```
//! Both terminal states are final; nothing is retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures_util::StreamExt;

use crate::observability::metrics;
use crate::relay::{RelayError, Sink, Source};

/// Relaxed ordering is enough; IDs only need to be unique.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "relay-{}", self.0)
    }
}

/// Summary of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub bytes_delivered: u64,
    pub chunks: u64,
    pub elapsed: Duration,
}

/// Binds one source to one sink for a single transfer.
///
/// Both halves are owned by the session and dropped when `run` returns.
pub struct RelaySession<S, K> {
    id: SessionId,
    source: S,
    sink: K,
}

impl<S, K> RelaySession<S, K>
where
    S: Source,
    K: Sink,
{
    pub fn new(source: S, sink: K) -> Self {
        Self {
            id: SessionId::new(),
            source,
            sink,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Move every chunk from the source to the sink.
    ///
    /// The sink is awaited for readiness before each read, so at most one
    /// chunk is held here at any time and nothing is read while the sink
    /// is saturated.
    pub async fn run(self) -> Result<RelayReport, RelayError> {
        let Self {
            id,
            mut source,
            mut sink,
        } = self;
        let started = Instant::now();
        let mut bytes_delivered = 0u64;
        let mut chunks = 0u64;

        tracing::debug!(session = %id, "Relay started");

        let result = loop {
            if sink.ready().await.is_err() {
                break Err(RelayError::SinkWriteFailure { bytes_delivered });
            }

            match source.next().await {
                Some(Ok(chunk)) => {
                    let len = chunk.len() as u64;
                    if sink.write(chunk).is_err() {
                        break Err(RelayError::SinkWriteFailure { bytes_delivered });
                    }
                    bytes_delivered += len;
                    chunks += 1;
                }
                Some(Err(source_err)) => {
                    let err = RelayError::SourceReadFailure {
                        bytes_delivered,
                        source: source_err,
                    };
                    sink.abort(&err).await;
                    break Err(err);
                }
                None => {
                    sink.finish();
                    break Ok(RelayReport {
                        bytes_delivered,
                        chunks,
                        elapsed: started.elapsed(),
                    });
                }
            }
        };

        drop(source);
        metrics::record_session(&result, started);

        match &result {
            Ok(report) => tracing::debug!(
                session = %id,
                bytes = report.bytes_delivered,
                chunks = report.chunks,
                elapsed = ?report.elapsed,
                "Relay completed"
            ),
            Err(e @ RelayError::SinkWriteFailure { .. }) => tracing::info!(
                session = %id,
                bytes = e.bytes_delivered(),
                "Relay stopped, sink closed"
            ),
            Err(e) => tracing::warn!(session = %id, error = %e, "Relay failed"),
        }

        result
    }
}

/// Relay `source` into `sink` until one of them ends.
pub async fn relay<S, K>(source: S, sink: K) -> Result<RelayReport, RelayError>
where
    S: Source,
    K: Sink,
{
    RelaySession::new(source, sink).run().await
}
