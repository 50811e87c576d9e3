//! The boundary between a running loop and whatever renders it.
//!
//! A view talks to the loop through two channels only: it writes events into
//! an [`EventSink`] and reads view states from a [`ViewStream`].

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;

/// Cloneable sender a view uses to feed events into a loop.
///
/// Events are appended to the loop's queue and applied in arrival order.
/// After the loop has stopped, sent events are silently discarded.
pub struct EventSink<Event> {
    tx: mpsc::UnboundedSender<Event>,
}

impl<Event> Clone for EventSink<Event> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<Event: Send + 'static> EventSink<Event> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    /// Enqueue an event.  Returns silently if the loop has stopped.
    pub fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Returns `true` once the loop no longer accepts events.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Stream of view states published by a loop.
///
/// Most-recent-wins: a slow reader skips intermediate states and always sees
/// the latest one.  The first item is the state current at subscription time.
/// The stream ends when the loop stops.
pub struct ViewStream<V> {
    inner: WatchStream<V>,
}

impl<V: Clone + Send + Sync + 'static> ViewStream<V> {
    pub(crate) fn new(rx: watch::Receiver<V>) -> Self {
        Self {
            inner: WatchStream::new(rx),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Stream for ViewStream<V> {
    type Item = V;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<V>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
