//! Id allocation and task construction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use diffexec_core::EnvDescr;
use tracing::{debug, error};

use crate::completion::{self, ResultReceiver};
use crate::error::QueueError;
use crate::registry::TaskRegistry;
use crate::task::{ExecTask, Priority, TaskId};

/// Mints task ids and builds tasks with their registry entry already in place.
///
/// Ids come from a lock-free counter starting at 0 and are never reused for
/// the lifetime of the factory. Each scheduler owns one factory, so ids are
/// unique per registry.
#[derive(Debug)]
pub struct TaskFactory<O> {
    next_id: AtomicU64,
    registry: Arc<TaskRegistry<O>>,
}

impl<O> TaskFactory<O> {
    pub fn new(registry: Arc<TaskRegistry<O>>) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry<O>> {
        &self.registry
    }

    /// Create a task for any environment.
    ///
    /// Returns the task, ready to be pushed, and the receive side of its
    /// completion handle. The caller must eventually call
    /// [`destroy_task`](Self::destroy_task) or [`destroy`](Self::destroy).
    pub fn create_task<P>(
        &self,
        program: P,
        priority: Priority,
    ) -> Result<(ExecTask<P>, ResultReceiver<O>), QueueError> {
        self.create_task_in(program, priority, EnvDescr::AnyEnvironment)
    }

    /// Create a task tagged with an environment requirement.
    pub fn create_task_in<P>(
        &self,
        program: P,
        priority: Priority,
        env: EnvDescr,
    ) -> Result<(ExecTask<P>, ResultReceiver<O>), QueueError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = completion::channel(id);

        if let Err(e) = self.registry.register(id, sender) {
            error!(task_id = id, "task id allocator produced a live id");
            return Err(e);
        }

        debug!(task_id = id, priority, env = %env, "task created");
        Ok((ExecTask::new(id, program, priority, env), receiver))
    }

    /// Remove the registry entry of `task`.
    pub fn destroy_task<P>(&self, task: &ExecTask<P>) {
        self.destroy(task.id());
    }

    /// Remove the registry entry for `id`. Idempotent.
    pub fn destroy(&self, id: TaskId) {
        self.registry.unregister(id);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Barrier, Mutex};
    use std::thread;

    use super::*;

    fn factory() -> TaskFactory<u32> {
        TaskFactory::new(Arc::new(TaskRegistry::new()))
    }

    #[test]
    fn ids_start_at_zero_and_increase() {
        let factory = factory();
        let ids: Vec<TaskId> = (0..5)
            .map(|i| factory.create_task(i, 0).unwrap().0.id())
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn created_task_is_registered() {
        let factory = factory();
        let (task, rx) = factory.create_task("prog", 3).unwrap();
        assert_eq!(rx.id(), task.id());
        assert!(factory.registry().contains(task.id()));
        assert_eq!(task.env(), EnvDescr::AnyEnvironment);
    }

    #[test]
    fn destroy_task_removes_entry_and_is_idempotent() {
        let factory = factory();
        let (task, _rx) = factory.create_task((), 0).unwrap();
        factory.destroy_task(&task);
        factory.destroy_task(&task);
        assert!(factory.registry().lookup(task.id()).is_none());
    }

    #[test]
    fn create_task_in_keeps_env_tag() {
        let factory = factory();
        let (task, _rx) = factory
            .create_task_in("prog", 1, EnvDescr::NewEnvironment)
            .unwrap();
        assert_eq!(task.env(), EnvDescr::NewEnvironment);
    }

    #[test]
    fn three_concurrent_creators_get_exact_id_set() {
        let factory = Arc::new(factory());
        let barrier = Arc::new(Barrier::new(3));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let factory = Arc::clone(&factory);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    factory.create_task("p", 0).unwrap().0.id()
                })
            })
            .collect();

        let ids: HashSet<TaskId> = handles
            .into_iter()
            .map(|h| h.join().expect("creator thread panicked"))
            .collect();
        assert_eq!(ids, HashSet::from([0, 1, 2]));
    }

    #[test]
    fn ids_unique_under_contention() {
        let factory = Arc::new(factory());
        let threads = 8;
        let per_thread = 250;
        let barrier = Arc::new(Barrier::new(threads));
        let seen: Arc<Mutex<HashSet<TaskId>>> = Arc::new(Mutex::new(HashSet::new()));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let factory = Arc::clone(&factory);
                let barrier = Arc::clone(&barrier);
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..per_thread {
                        let (task, _rx) = factory.create_task((), 0).unwrap();
                        // Each id should be observed at most once.
                        assert!(seen.lock().unwrap().insert(task.id()));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("creator thread panicked");
        }
        assert_eq!(seen.lock().unwrap().len(), threads * per_thread);
        assert_eq!(factory.registry().len(), threads * per_thread);
    }
}
