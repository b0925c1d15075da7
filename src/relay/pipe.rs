//! One-call relay into a channel-backed body.

use tokio::task::JoinHandle;

use crate::relay::{ChannelBody, ChannelSink, RelayError, RelayReport, RelaySession, Source};

/// Spawn a relay session from `source` into a new [`ChannelSink`].
///
/// Returns the consumer half and the session's handle. Dropping the body
/// stops the session at its next readiness check; dropping the handle
/// detaches it. Must be called from within a Tokio runtime.
pub fn pipe<S>(
    source: S,
    capacity: usize,
) -> (ChannelBody, JoinHandle<Result<RelayReport, RelayError>>)
where
    S: Source + 'static,
{
    let (sink, body) = ChannelSink::new(capacity);
    let session = RelaySession::new(source, sink);
    tracing::trace!(session = %session.id(), capacity, "Piping source");
    let handle = tokio::spawn(session.run());
    (body, handle)
}
