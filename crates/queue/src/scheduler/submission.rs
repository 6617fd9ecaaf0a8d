use std::sync::Arc;
use std::time::Duration;

use crate::completion::ResultReceiver;
use crate::error::QueueError;
use crate::registry::TaskRegistry;
use crate::task::TaskId;

/// Removes a task's registry entry when dropped.
#[derive(Debug)]
struct EntryGuard<O> {
    id: TaskId,
    registry: Arc<TaskRegistry<O>>,
}

impl<O> Drop for EntryGuard<O> {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

/// Submitter's handle on an admitted task.
///
/// Waiting consumes the handle. Whichever way the submitter leaves (outcome
/// received, timeout, the wait future dropped, or the handle dropped unused)
/// the registry entry is removed, and any later delivery for the task is
/// dropped.
#[derive(Debug)]
pub struct Submission<O> {
    receiver: ResultReceiver<O>,
    guard: EntryGuard<O>,
}

impl<O> Submission<O> {
    pub(crate) fn new(receiver: ResultReceiver<O>, registry: Arc<TaskRegistry<O>>) -> Self {
        let id = receiver.id();
        Self {
            receiver,
            guard: EntryGuard { id, registry },
        }
    }

    pub fn id(&self) -> TaskId {
        self.guard.id
    }

    /// Suspend until the outcome arrives.
    pub async fn wait(self) -> Result<O, QueueError> {
        let Submission { receiver, guard } = self;
        let result = receiver.wait().await;
        drop(guard);
        result
    }

    /// Suspend until the outcome arrives or `after` elapses.
    pub async fn wait_timeout(self, after: Duration) -> Result<O, QueueError> {
        let Submission { receiver, guard } = self;
        let result = receiver.wait_timeout(after).await;
        drop(guard);
        result
    }

    /// [`wait_timeout`](Self::wait_timeout) when `timeout` is set, else [`wait`](Self::wait).
    pub async fn wait_for(self, timeout: Option<Duration>) -> Result<O, QueueError> {
        match timeout {
            Some(after) => self.wait_timeout(after).await,
            None => self.wait().await,
        }
    }

    /// Block the current thread until the outcome arrives.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait_blocking(self) -> Result<O, QueueError> {
        let Submission { receiver, guard } = self;
        let result = receiver.wait_blocking();
        drop(guard);
        result
    }
}
