//! Unbuffered multi-consumer handoff channel.
//!
//! `send` completes only after a receiver has actually taken the
//! item, so the producer can never run ahead of the consumers.
//! Any number of cloned receivers compete for items; each item
//! goes to exactly one of them.
//!
//! Closure:
//! - dropping the sender ends every receiver loop once the
//!   pending item (if any) has been taken
//! - dropping every receiver makes `send` fail with `ChannelClosed`

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};

use crate::error::ChannelClosed;

/// An item in flight plus the acknowledgement the producer waits on.
struct Parcel<T> {
    item: T,
    taken: oneshot::Sender<()>,
}

/// Creates a connected sender / receiver pair.
pub fn channel<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    // Capacity 1 is the minimum tokio allows; the ack below keeps
    // the effective buffer at zero.
    let (tx, rx) = mpsc::channel(1);

    (
        HandoffSender { tx },
        HandoffReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Single producer side.
pub struct HandoffSender<T> {
    tx: mpsc::Sender<Parcel<T>>,
}

impl<T> HandoffSender<T> {
    /// Hands `item` to a receiver, waiting until one has taken it.
    pub async fn send(&self, item: T) -> Result<(), ChannelClosed> {
        let (taken, ack) = oneshot::channel();

        self.tx
            .send(Parcel { item, taken })
            .await
            .map_err(|_| ChannelClosed)?;

        // Err here means the parcel was dropped unread with the receivers
        ack.await.map_err(|_| ChannelClosed)
    }
}

/// Consumer side, cloned once per worker.
pub struct HandoffReceiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<Parcel<T>>>>,
}

impl<T> Clone for HandoffReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> HandoffReceiver<T> {
    /// Takes the next item, or `None` once the sender is gone.
    pub async fn recv(&self) -> Option<T> {
        let parcel = {
            let mut rx = self.rx.lock().await;
            rx.recv().await
        }?;

        // The producer may have given up already; the item is ours either way
        let _ = parcel.taken.send(());
        Some(parcel.item)
    }
}
