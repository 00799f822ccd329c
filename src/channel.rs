//! A bounded, closable, cancellable producer/consumer channel.
//!
//! Decouples a handler task producing response body items (chunks or SSE
//! events) from the task serializing them onto the connection, backed by
//! `tokio::sync::mpsc` with a bounded capacity of 10 items. Adds an explicit
//! `cancel`, which tokio's mpsc has no native equivalent for, layered on
//! with a flag plus a [`tokio::sync::Notify`] to wake whichever side is
//! waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use crate::error::{Error, Result};

const CAPACITY: usize = 10;

struct Shared {
    cancelled: AtomicBool,
    notify: Notify,
}

/// The producer half of a [`channel`].
pub struct Sender<T> {
    tx: Option<mpsc::Sender<T>>,
    shared: Arc<Shared>,
}

/// The consumer half of a [`channel`].
pub struct Receiver<T> {
    rx: mpsc::Receiver<T>,
    shared: Arc<Shared>,
}

/// Creates a bounded channel with a fixed capacity of 10 items.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = mpsc::channel(CAPACITY);
    let shared = Arc::new(Shared {
        cancelled: AtomicBool::new(false),
        notify: Notify::new(),
    });
    (
        Sender { tx: Some(tx), shared: shared.clone() },
        Receiver { rx, shared },
    )
}

impl<T> Sender<T> {
    /// Sends one item, waiting for buffer space. Fails if the channel was
    /// closed or cancelled, or if the receiver was dropped.
    pub async fn send(&self, item: T) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(Error::Cancelled)?;
        if self.shared.cancelled.load(Ordering::Acquire) {
            return Err(Error::Cancelled);
        }
        let notified = self.shared.notify.notified();
        tokio::select! {
            res = tx.send(item) => res.map_err(|_| Error::Cancelled),
            _ = notified => Err(Error::Cancelled),
        }
    }

    /// Sends one item without waiting for buffer space. Returns `Ok(false)`
    /// (rather than an error) when the buffer is full, so a caller like a
    /// heartbeat producer can drop the item and log instead of stalling.
    pub fn try_send(&self, item: T) -> Result<bool> {
        let tx = self.tx.as_ref().ok_or(Error::Cancelled)?;
        if self.shared.cancelled.load(Ordering::Acquire) {
            return Err(Error::Cancelled);
        }
        match tx.try_send(item) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("channel full, dropping item");
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::Cancelled),
        }
    }

    /// Gracefully ends the stream: no more sends are accepted, but items
    /// already buffered are still delivered to the receiver before it sees
    /// end-of-stream.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Immediately fails any in-flight or future send/receive with
    /// [`Error::Cancelled`], discarding whatever is still buffered.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
        self.shared.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }
}

impl<T> Receiver<T> {
    /// Waits for the next item. Returns `Ok(None)` once the sender has
    /// closed and every buffered item has been delivered.
    pub async fn receive(&mut self) -> Result<Option<T>> {
        if self.shared.cancelled.load(Ordering::Acquire) {
            return Err(Error::Cancelled);
        }
        let notified = self.shared.notify.notified();
        tokio::select! {
            item = self.rx.recv() => Ok(item),
            _ = notified => Err(Error::Cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_items_in_order() {
        let (tx, mut rx) = channel::<i32>();
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        assert_eq!(rx.receive().await.unwrap(), Some(1));
        assert_eq!(rx.receive().await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn close_drains_then_eof() {
        let (mut tx, mut rx) = channel::<i32>();
        tx.send(1).await.unwrap();
        tx.close();
        assert!(tx.send(2).await.is_err());
        assert_eq!(rx.receive().await.unwrap(), Some(1));
        assert_eq!(rx.receive().await.unwrap(), None);
    }

    #[tokio::test]
    async fn cancel_fails_pending_receive() {
        let (tx, mut rx) = channel::<i32>();
        let waiter = tokio::spawn(async move { rx.receive().await });
        tokio::task::yield_now().await;
        tx.cancel();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn try_send_reports_full_buffer_without_erroring() {
        let (tx, _rx) = channel::<i32>();
        for i in 0..CAPACITY as i32 {
            assert!(tx.try_send(i).unwrap());
        }
        assert!(!tx.try_send(999).unwrap());
    }
}
