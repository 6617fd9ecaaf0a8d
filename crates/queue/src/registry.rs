//! Task id → completion handle correlation map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::completion::ResultSender;
use crate::error::QueueError;
use crate::task::TaskId;

/// Correlates asynchronous completions with the task that produced them.
///
/// One mutex guards the whole map and is held only for the duration of a
/// single insert, lookup or removal. Entries live from task creation until
/// someone calls [`unregister`](Self::unregister).
#[derive(Debug)]
pub struct TaskRegistry<O> {
    entries: Mutex<HashMap<TaskId, Arc<ResultSender<O>>>>,
}

impl<O> Default for TaskRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> TaskRegistry<O> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // Map updates are single calls, so a panicking holder can't leave it
    // half-modified.
    fn entries(&self) -> MutexGuard<'_, HashMap<TaskId, Arc<ResultSender<O>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a mapping. An id that is already present is rejected, never
    /// overwritten.
    pub fn register(&self, id: TaskId, handle: Arc<ResultSender<O>>) -> Result<(), QueueError> {
        let mut entries = self.entries();
        if entries.contains_key(&id) {
            return Err(QueueError::IdCollision(id));
        }
        entries.insert(id, handle);
        Ok(())
    }

    /// The registered handle for `id`, or `None` if there is none.
    pub fn lookup(&self, id: TaskId) -> Option<Arc<ResultSender<O>>> {
        self.entries().get(&id).cloned()
    }

    /// Remove the mapping for `id`. Returns whether an entry was removed;
    /// removing an absent id is a no-op.
    pub fn unregister(&self, id: TaskId) -> bool {
        self.entries().remove(&id).is_some()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.entries().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
