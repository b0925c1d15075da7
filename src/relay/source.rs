//! Byte sources.
//!
//! # Responsibilities
//! - Open the backing file, failing before any output is produced
//! - Produce ordered chunks of at most `chunk_size` bytes
//! - Release the file handle when dropped

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::relay::RelayError;

/// An ordered, finite producer of byte chunks.
///
/// The end of the stream is end-of-data; an `Err` item is a read failure.
pub trait Source: Stream<Item = io::Result<Bytes>> + Unpin + Send {}

impl<T> Source for T where T: Stream<Item = io::Result<Bytes>> + Unpin + Send {}

/// A file read in fixed-size chunks.
pub struct FileSource {
    path: PathBuf,
    len: u64,
    position: u64,
    inner: ReaderStream<File>,
}

impl FileSource {
    /// Open `path` for streaming.
    ///
    /// Any failure here is reported as [`RelayError::SourceUnavailable`].
    pub async fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let unavailable = |source: io::Error| RelayError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).await.map_err(unavailable)?;
        let metadata = file.metadata().await.map_err(unavailable)?;
        if !metadata.is_file() {
            return Err(unavailable(io::Error::other("not a regular file")));
        }

        tracing::trace!(path = %path.display(), len = metadata.len(), "Source opened");

        Ok(Self {
            path: path.to_path_buf(),
            len: metadata.len(),
            position: 0,
            inner: ReaderStream::with_capacity(file, chunk_size),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File length at open time.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes produced so far.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Stream for FileSource {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let item = ready!(Pin::new(&mut self.inner).poll_next(cx));
        if let Some(Ok(chunk)) = &item {
            self.position += chunk.len() as u64;
        }
        Poll::Ready(item)
    }
}

impl Drop for FileSource {
    fn drop(&mut self) {
        tracing::trace!(
            path = %self.path.display(),
            position = self.position,
            "Source released"
        );
    }
}
