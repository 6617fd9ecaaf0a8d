//! Routes executor outcomes back to the submitting caller.

use std::sync::Arc;

use tracing::{error, trace, warn};

use crate::error::QueueError;
use crate::registry::TaskRegistry;
use crate::task::TaskId;

/// What happened to an outcome handed to [`ResultCorrelator::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent on the task's completion handle.
    Delivered,
    /// No registry entry: the submitter gave up or the id is stale.
    Dropped,
}

/// Delivery path from executors to submitters, backed by a shared registry.
#[derive(Debug)]
pub struct ResultCorrelator<O> {
    registry: Arc<TaskRegistry<O>>,
}

impl<O> Clone for ResultCorrelator<O> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<O> ResultCorrelator<O> {
    pub fn new(registry: Arc<TaskRegistry<O>>) -> Self {
        Self { registry }
    }

    /// Deliver `outcome` to whoever submitted task `id`.
    ///
    /// Unknown ids are dropped with a warning. A second delivery for the same
    /// task is a [`QueueError::DuplicateDelivery`], which callers must treat
    /// as fatal.
    pub fn deliver(&self, id: TaskId, outcome: O) -> Result<Delivery, QueueError> {
        let Some(handle) = self.registry.lookup(id) else {
            warn!(task_id = id, "outcome for unknown task dropped");
            return Ok(Delivery::Dropped);
        };

        // Registry lock is released by now; completing never holds it.
        if let Err(e) = handle.complete(outcome) {
            error!(task_id = id, error = %e, "outcome delivered twice");
            return Err(e);
        }
        trace!(task_id = id, "outcome delivered");
        Ok(Delivery::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::TaskFactory;

    fn setup() -> (TaskFactory<String>, ResultCorrelator<String>) {
        let registry = Arc::new(TaskRegistry::new());
        (
            TaskFactory::new(Arc::clone(&registry)),
            ResultCorrelator::new(registry),
        )
    }

    #[test]
    fn deliver_reaches_receiver() {
        let (factory, correlator) = setup();
        let (task, rx) = factory.create_task("prog", 0).unwrap();

        let delivery = correlator.deliver(task.id(), "ok".to_string()).unwrap();
        assert_eq!(delivery, Delivery::Delivered);
        assert_eq!(rx.wait_blocking().unwrap(), "ok");
    }

    #[test]
    fn deliver_to_unknown_id_is_dropped() {
        let (_factory, correlator) = setup();
        let delivery = correlator.deliver(77, "lost".to_string()).unwrap();
        assert_eq!(delivery, Delivery::Dropped);
    }

    #[test]
    fn deliver_after_destroy_is_dropped() {
        let (factory, correlator) = setup();
        let (task, rx) = factory.create_task("prog", 0).unwrap();
        factory.destroy_task(&task);

        assert_eq!(
            correlator.deliver(task.id(), "late".to_string()).unwrap(),
            Delivery::Dropped
        );
        assert!(matches!(rx.wait_blocking(), Err(QueueError::Abandoned(_))));
    }

    #[test]
    fn second_delivery_is_fatal() {
        let (factory, correlator) = setup();
        let (task, rx) = factory.create_task("prog", 0).unwrap();

        correlator.deliver(task.id(), "first".to_string()).unwrap();
        let err = correlator
            .deliver(task.id(), "second".to_string())
            .unwrap_err();
        assert!(matches!(err, QueueError::DuplicateDelivery(id) if id == task.id()));
        assert!(err.is_fatal());
        assert_eq!(rx.wait_blocking().unwrap(), "first");
    }

    #[test]
    fn delivery_to_abandoned_receiver_still_counts() {
        let (factory, correlator) = setup();
        let (task, rx) = factory.create_task("prog", 0).unwrap();
        drop(rx);
        assert_eq!(
            correlator.deliver(task.id(), "nobody".to_string()).unwrap(),
            Delivery::Delivered
        );
    }
}
