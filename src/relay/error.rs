//! Relay error kinds.

use std::io;
use std::path::PathBuf;

/// Terminal failure of a relay session.
///
/// None of these are retried. Use [`RelayError::bytes_delivered`] to tell an
/// early failure (response still uncommitted) from one that truncated output.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The source could not be opened at all.
    #[error("source {} unavailable: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading failed after the transfer had started.
    #[error("source read failed after {bytes_delivered} bytes: {source}")]
    SourceReadFailure {
        bytes_delivered: u64,
        #[source]
        source: io::Error,
    },

    /// The sink stopped accepting data, usually because the peer went away.
    #[error("sink stopped accepting data after {bytes_delivered} bytes")]
    SinkWriteFailure { bytes_delivered: u64 },
}

impl RelayError {
    /// Bytes handed to the sink before the failure.
    pub fn bytes_delivered(&self) -> u64 {
        match self {
            RelayError::SourceUnavailable { .. } => 0,
            RelayError::SourceReadFailure { bytes_delivered, .. }
            | RelayError::SinkWriteFailure { bytes_delivered } => *bytes_delivered,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::SourceUnavailable { .. } => "source_unavailable",
            RelayError::SourceReadFailure { .. } => "source_read_failure",
            RelayError::SinkWriteFailure { .. } => "sink_write_failure",
        }
    }
}
