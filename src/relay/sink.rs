//! Byte sinks.
//!
//! # Responsibilities
//! - Signal when the consumer can take another chunk
//! - Accept chunks in order, one per readiness signal
//! - End the stream cleanly (`finish`) or with an error (`abort`)
//!
//! # Design Decisions
//! - `ChannelSink` reserves a slot in a bounded channel before each write;
//!   the reservation is the "ready" signal and the channel bound is the
//!   only buffering between relay and consumer
//! - The consumer half is a `Stream` that an HTTP body can wrap, so the
//!   socket's drain rate reaches the relay through the channel
//! - `abort` never waits; an error that finds the queue full is delivered
//!   after the queued chunks instead of a clean end

use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::relay::RelayError;

/// The consumer is gone; nothing more can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sink closed")]
pub struct SinkClosed;

/// An ordered consumer of byte chunks.
pub trait Sink: Send {
    /// Wait until the sink can accept one more chunk.
    ///
    /// Cancel-safe: dropping the future leaves the sink as it was.
    fn ready(&mut self) -> impl Future<Output = Result<(), SinkClosed>> + Send;

    /// Hand over one chunk. Only valid after `ready` resolved.
    fn write(&mut self, chunk: Bytes) -> Result<(), SinkClosed>;

    /// Signal that no more data will arrive.
    fn finish(self);

    /// Terminate the consumer with an observable failure.
    fn abort(self, reason: &RelayError) -> impl Future<Output = ()> + Send;
}

type Item = io::Result<Bytes>;

enum Slot {
    Idle(mpsc::Sender<Item>),
    Reserved(mpsc::OwnedPermit<Item>),
    Closed,
}

/// Sink backed by a bounded channel.
pub struct ChannelSink {
    slot: Slot,
    failure: Failure,
}

/// Abort reason handed to the body when the channel had no room for it.
type Failure = Arc<Mutex<Option<io::Error>>>;

fn lock(failure: &Failure) -> MutexGuard<'_, Option<io::Error>> {
    failure.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChannelSink {
    /// Create a sink and the body stream that drains it.
    ///
    /// At most `capacity` chunks are queued between the two halves.
    pub fn new(capacity: usize) -> (Self, ChannelBody) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let failure = Failure::default();
        (
            Self {
                slot: Slot::Idle(tx),
                failure: failure.clone(),
            },
            ChannelBody { rx, failure },
        )
    }
}

impl Sink for ChannelSink {
    async fn ready(&mut self) -> Result<(), SinkClosed> {
        // Reserve through a clone so a cancelled wait leaves the sink Idle.
        let tx = match &self.slot {
            Slot::Idle(tx) => tx.clone(),
            Slot::Reserved(_) => return Ok(()),
            Slot::Closed => return Err(SinkClosed),
        };

        match tx.reserve_owned().await {
            Ok(permit) => {
                self.slot = Slot::Reserved(permit);
                Ok(())
            }
            Err(_) => {
                self.slot = Slot::Closed;
                Err(SinkClosed)
            }
        }
    }

    fn write(&mut self, chunk: Bytes) -> Result<(), SinkClosed> {
        match mem::replace(&mut self.slot, Slot::Closed) {
            Slot::Reserved(permit) => {
                self.slot = Slot::Idle(permit.send(Ok(chunk)));
                Ok(())
            }
            // Writing without a reservation would bypass the channel bound.
            Slot::Idle(tx) => {
                self.slot = Slot::Idle(tx);
                Err(SinkClosed)
            }
            Slot::Closed => Err(SinkClosed),
        }
    }

    fn finish(self) {
        // Dropping the sender ends the body stream once it is drained.
    }

    async fn abort(self, reason: &RelayError) {
        let error = io::Error::other(reason.to_string());
        match self.slot {
            Slot::Reserved(permit) => {
                permit.send(Err(error));
            }
            // Never wait on a stalled consumer: park the error behind the
            // queued chunks and drop the sender.
            Slot::Idle(tx) => match tx.try_send(Err(error)) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(item)) => {
                    *lock(&self.failure) = item.err();
                }
            },
            Slot::Closed => {}
        }
    }
}

/// Consumer half of a [`ChannelSink`].
///
/// Yields chunks in write order; an `Err` item means the transfer was aborted.
#[derive(Debug)]
pub struct ChannelBody {
    rx: mpsc::Receiver<Item>,
    failure: Failure,
}

impl Stream for ChannelBody {
    type Item = Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match ready!(self.rx.poll_recv(cx)) {
            Some(item) => Poll::Ready(Some(item)),
            None => Poll::Ready(lock(&self.failure).take().map(Err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn full_channel_is_not_ready() {
        let (mut sink, mut body) = ChannelSink::new(1);

        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"first")).unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(20), sink.ready()).await;
        assert!(blocked.is_err(), "sink must not be ready while the channel is full");

        let chunk = body.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"first");

        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"second")).unwrap();
        sink.finish();

        let chunk = body.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"second");
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn write_without_ready_is_rejected() {
        let (mut sink, _body) = ChannelSink::new(4);
        assert_eq!(sink.write(Bytes::from_static(b"x")), Err(SinkClosed));
    }

    #[tokio::test]
    async fn dropped_body_closes_sink() {
        let (mut sink, body) = ChannelSink::new(4);
        drop(body);
        assert_eq!(sink.ready().await, Err(SinkClosed));
    }

    #[tokio::test]
    async fn cancelled_ready_keeps_sink_open() {
        let (mut sink, mut body) = ChannelSink::new(1);
        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"first")).unwrap();

        for _ in 0..3 {
            let waited = tokio::time::timeout(Duration::from_millis(10), sink.ready()).await;
            assert!(waited.is_err());
        }

        assert_eq!(&body.next().await.unwrap().unwrap()[..], b"first");
        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"second")).unwrap();
        sink.finish();

        assert_eq!(&body.next().await.unwrap().unwrap()[..], b"second");
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn abort_on_full_channel_does_not_wait() {
        let (mut sink, mut body) = ChannelSink::new(1);
        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"queued")).unwrap();

        let reason = RelayError::SourceReadFailure {
            bytes_delivered: 6,
            source: io::Error::other("disk gone"),
        };
        tokio::time::timeout(Duration::from_secs(1), sink.abort(&reason))
            .await
            .expect("abort must not wait for a stalled consumer");

        assert_eq!(&body.next().await.unwrap().unwrap()[..], b"queued");
        assert!(body.next().await.unwrap().is_err());
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn abort_without_reservation_with_room() {
        let (mut sink, mut body) = ChannelSink::new(4);
        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"one")).unwrap();

        let reason = RelayError::SinkWriteFailure { bytes_delivered: 3 };
        sink.abort(&reason).await;

        assert_eq!(&body.next().await.unwrap().unwrap()[..], b"one");
        assert!(body.next().await.unwrap().is_err());
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn abort_surfaces_error_after_queued_chunks() {
        let (mut sink, mut body) = ChannelSink::new(4);
        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"partial")).unwrap();

        let reason = RelayError::SourceReadFailure {
            bytes_delivered: 7,
            source: io::Error::other("disk gone"),
        };
        sink.abort(&reason).await;

        assert_eq!(&body.next().await.unwrap().unwrap()[..], b"partial");
        assert!(body.next().await.unwrap().is_err());
        assert!(body.next().await.is_none());
    }
}
