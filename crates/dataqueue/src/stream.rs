//! Zero-capacity rendezvous stream between producer and consumer workers.
//!
//! Tokio's bounded MPSC channel needs a capacity of at least one, so each
//! delivery carries a [`oneshot`] acknowledgement. A producer's delivery
//! completes only once a reader has taken the item off the queue, which gives
//! the same blocking put/get pairing as an unbuffered channel: a producer can
//! never run ahead of the consumers by more than the item it is handing over.
//!
//! The write half ([`StreamSender`]) never leaves the crate. The stream closes
//! when the last sender is dropped, so closing after every writer is gone is a
//! property of ownership rather than of call ordering.

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};

type Delivery<T> = (T, oneshot::Sender<()>);

/// Creates a connected sender/stream pair.
pub(crate) fn channel<T>() -> (StreamSender<T>, Stream<T>) {
    let (tx, rx) = mpsc::channel(1);
    (
        StreamSender { tx },
        Stream {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Write half of a [`Stream`], held by the producer pool and its workers.
pub(crate) struct StreamSender<T> {
    tx: mpsc::Sender<Delivery<T>>,
}

impl<T> Clone for StreamSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> StreamSender<T> {
    /// Hands `item` to a reader, waiting until one has taken it.
    ///
    /// Returns `false` if every reader is gone and the item was dropped.
    pub(crate) async fn deliver(&self, item: T) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send((item, ack_tx)).await.is_err() {
            return false;
        }
        // A dropped acknowledgement means the receiver was dropped with the
        // delivery still queued.
        ack_rx.await.is_ok()
    }
}

/// Read-only view of the stream a producer pool writes to.
///
/// Cloning is cheap and every clone reads from the same queue: each item is
/// received by exactly one reader. Once every producer worker has exited and
/// the pool has been waited on, [`Stream::recv`] returns `None`.
pub struct Stream<T> {
    rx: Arc<Mutex<mpsc::Receiver<Delivery<T>>>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> Stream<T> {
    /// Receives the next item, or `None` once the stream is closed.
    ///
    /// This method is cancel safe: if the future is dropped before it
    /// resolves, no item is lost.
    pub async fn recv(&self) -> Option<T> {
        let (item, ack) = self.rx.lock().await.recv().await?;
        // The producer only waits on the acknowledgement, it never needs the
        // value, so a producer that has gone away is not an error here.
        let _ = ack.send(());
        Some(item)
    }

    /// Returns `true` if both views read from the same queue.
    pub fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rx, &other.rx)
    }
}
