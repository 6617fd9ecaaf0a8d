//! One-shot completion handle pairing a task with its submitter.
//!
//! The send side lives in the [`TaskRegistry`](crate::TaskRegistry) and can be
//! completed at most once. The receive side is owned by the submitter and
//! resolves exactly once: with the outcome, or with
//! [`QueueError::Abandoned`] if the send side is dropped first.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::QueueError;
use crate::task::TaskId;

/// Create a connected sender/receiver pair for `id`.
pub fn channel<O>(id: TaskId) -> (Arc<ResultSender<O>>, ResultReceiver<O>) {
    let (tx, rx) = oneshot::channel();
    (
        Arc::new(ResultSender {
            id,
            slot: Mutex::new(Some(tx)),
        }),
        ResultReceiver { id, rx },
    )
}

/// Write-once side of a completion handle.
#[derive(Debug)]
pub struct ResultSender<O> {
    id: TaskId,
    slot: Mutex<Option<oneshot::Sender<O>>>,
}

impl<O> ResultSender<O> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Deliver the outcome.
    ///
    /// Fails with [`QueueError::DuplicateDelivery`] if an outcome was already
    /// sent. A receiver that has gone away is not an error: the outcome is
    /// discarded.
    pub fn complete(&self, outcome: O) -> Result<(), QueueError> {
        let tx = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(QueueError::DuplicateDelivery(self.id))?;

        if tx.send(outcome).is_err() {
            debug!(task_id = self.id, "receiver gone, outcome discarded");
        }
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Read-once side of a completion handle.
#[derive(Debug)]
pub struct ResultReceiver<O> {
    id: TaskId,
    rx: oneshot::Receiver<O>,
}

impl<O> ResultReceiver<O> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Suspend until the outcome arrives. No timeout.
    pub async fn wait(self) -> Result<O, QueueError> {
        let id = self.id;
        self.rx.await.map_err(|_| QueueError::Abandoned(id))
    }

    /// Block the current thread until the outcome arrives.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait_blocking(self) -> Result<O, QueueError> {
        let id = self.id;
        self.rx.blocking_recv().map_err(|_| QueueError::Abandoned(id))
    }

    /// Like [`wait`](Self::wait), bounded by `after`.
    pub async fn wait_timeout(self, after: Duration) -> Result<O, QueueError> {
        let id = self.id;
        match tokio::time::timeout(after, self.rx).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(QueueError::Abandoned(id)),
            Err(_) => Err(QueueError::Timeout { id, after }),
        }
    }

    /// Take the outcome if it's already there, without waiting.
    pub fn try_take(&mut self) -> Result<Option<O>, QueueError> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(oneshot::error::TryRecvError::Empty) => Ok(None),
            Err(oneshot::error::TryRecvError::Closed) => Err(QueueError::Abandoned(self.id)),
        }
    }
}
