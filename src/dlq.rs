use std::sync::Arc;

use log::{debug, error};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

use crate::schema::FailedEmail;

/// Producer side of the DLQ channel, cloned into every worker.
pub type DlqSender = mpsc::Sender<FailedEmail>;

/// Dead letter queue shared between the collector and the coordinator.
pub type SharedDlq = Arc<Mutex<DeadLetterQueue>>;

/// ============================================================
/// DeadLetterQueue
/// ============================================================
///
/// Ordered record of every failed send of a run, in the order
/// the collector received them.
///
/// INVARIANTS:
/// - Only the collector appends, and only while the DLQ channel is open
/// - Entries are never removed
#[derive(Debug, Clone, Default)]
pub struct DeadLetterQueue {
    entries: Vec<FailedEmail>,
}

impl DeadLetterQueue {
    pub fn shared() -> SharedDlq {
        Arc::new(Mutex::new(Self::default()))
    }

    fn push(&mut self, failed: FailedEmail) {
        self.entries.push(failed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FailedEmail] {
        &self.entries
    }
}

#[cfg(test)]
impl From<Vec<FailedEmail>> for DeadLetterQueue {
    fn from(entries: Vec<FailedEmail>) -> Self {
        Self { entries }
    }
}

/// Creates the bounded DLQ channel.
///
/// Once `capacity` failures are waiting, workers block on send
/// until the collector catches up.
pub fn channel(capacity: usize) -> (DlqSender, mpsc::Receiver<FailedEmail>) {
    mpsc::channel(capacity)
}

/// Spawns the collector task.
///
/// The task drains `rx` into `dlq` and ends exactly when every
/// `DlqSender` has been dropped and the channel is empty.
///
/// RETURNS:
/// - handle resolving to the number of collected entries
pub fn spawn_collector(mut rx: mpsc::Receiver<FailedEmail>, dlq: SharedDlq) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut collected = 0;

        while let Some(failed) = rx.recv().await {
            debug!("dlq: recorded {} ({})", failed.recipient.email, failed.error);
            dlq.lock().await.push(failed);
            collected += 1;
        }

        debug!("dlq: channel closed, {} entries collected", collected);
        collected
    })
}

/// Enqueues a dead letter from a worker.
///
/// Only fails if the collector is gone, which the coordinator
/// never allows while workers run; the loss is logged loudly.
pub async fn report(tx: &DlqSender, failed: FailedEmail) {
    if let Err(mpsc::error::SendError(lost)) = tx.send(failed).await {
        error!(
            "dlq collector gone, failure for {} lost: {}",
            lost.recipient.email, lost.error
        );
    }
}

/// Takes the final queue out of the shared handle.
///
/// Called after the collector has finished, when the coordinator
/// holds the last reference.
pub async fn into_inner(dlq: SharedDlq) -> DeadLetterQueue {
    match Arc::try_unwrap(dlq) {
        Ok(mutex) => mutex.into_inner(),
        Err(shared) => shared.lock().await.clone(),
    }
}
