use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::correlator::Delivery;
use crate::error::QueueError;
use crate::task::ExecTask;

use super::executor::Executor;
use super::Scheduler;

/// One slot of dispatcher capacity. Released on drop, unwinding included.
struct ActiveSlot<'a, P, O> {
    scheduler: &'a Scheduler<P, O>,
}

impl<'a, P, O> ActiveSlot<'a, P, O> {
    fn acquire(scheduler: &'a Scheduler<P, O>) -> Self {
        scheduler.active.fetch_add(1, Ordering::AcqRel);
        Self { scheduler }
    }
}

impl<P, O> Drop for ActiveSlot<'_, P, O> {
    fn drop(&mut self) {
        self.scheduler.active.fetch_sub(1, Ordering::AcqRel);
        self.scheduler.notify_dispatcher();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<P, O> Scheduler<P, O>
where
    P: Serialize + Send,
    O: Send,
{
    /// Pop the highest-priority task and run it on the current thread.
    ///
    /// Returns `Ok(false)` when nothing is queued.
    pub fn dispatch_one(&self, executor: &dyn Executor<O>) -> Result<bool, QueueError> {
        match self.queue.pop() {
            Some(task) => {
                self.dispatch(task, executor)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run the dispatcher loop. Blocks until [`shutdown`](Self::shutdown).
    ///
    /// Tasks are executed on a `rayon` pool of `dispatchers` threads; this
    /// thread only pops and hands out work. When the loop exits it waits for
    /// in-flight executions, then abandons whatever is still queued.
    #[instrument(skip_all, fields(executor = executor.name()))]
    pub fn run(&self, executor: &dyn Executor<O>) -> Result<(), QueueError> {
        let dispatchers = self.config.resolved_dispatchers();
        let idle_backoff = self.config.idle_backoff();
        info!(dispatchers, "Scheduler starting");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(dispatchers)
            .thread_name(|i| format!("diffexec-dispatch-{i}"))
            .build()?;

        pool.in_place_scope(|scope| {
            while !self.is_shutdown() {
                if self.active.load(Ordering::Acquire) >= dispatchers {
                    self.wait_for_work(idle_backoff);
                    continue;
                }
                let Some(task) = self.queue.pop() else {
                    self.wait_for_work(idle_backoff);
                    continue;
                };

                let slot = ActiveSlot::acquire(self);
                scope.spawn(move |_| {
                    let _slot = slot;
                    match self.dispatch(task, executor) {
                        Ok(_) => {}
                        // Already logged at error level.
                        Err(e) if e.is_fatal() => {}
                        Err(QueueError::ExecutorPanicked { .. }) => {}
                        Err(e) => warn!(error = %e, "dispatch failed"),
                    }
                });
            }
        });

        let abandoned = self.abandon_queued();
        info!(abandoned, "Scheduler stopped");
        Ok(())
    }

    /// Execute one task and route its outcome.
    pub(super) fn dispatch(
        &self,
        task: ExecTask<P>,
        executor: &dyn Executor<O>,
    ) -> Result<Delivery, QueueError> {
        let id = task.id();
        let wire = match task.to_wire() {
            Ok(wire) => wire,
            Err(e) => {
                // Nothing can run it, so its submitter must not wait forever.
                self.factory.destroy_task(&task);
                if let Ok(mut m) = self.metrics.write() {
                    m.record_abandoned(1);
                }
                return Err(e);
            }
        };
        debug!(
            task_id = id,
            priority = task.priority(),
            queued_ms = task.age().as_millis() as u64,
            "dispatching task"
        );
        drop(task);

        let started = Instant::now();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&wire))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(task_id = id, executor = executor.name(), %message, "executor panicked");
                // Releases the submitter with `Abandoned`.
                self.factory.destroy(id);
                if let Ok(mut m) = self.metrics.write() {
                    m.record_abandoned(1);
                }
                return Err(QueueError::ExecutorPanicked { id, message });
            }
        };
        let elapsed = started.elapsed();
        if let Ok(mut m) = self.metrics.write() {
            m.record_dispatch(elapsed);
        }

        match self.correlator.deliver(id, outcome) {
            Ok(delivery) => {
                if let Ok(mut m) = self.metrics.write() {
                    m.record_delivery(delivery);
                }
                Ok(delivery)
            }
            Err(e) => {
                error!(task_id = id, executor = executor.name(), "executor produced a second outcome");
                if let Ok(mut m) = self.metrics.write() {
                    m.record_duplicate();
                }
                Err(e)
            }
        }
    }
}
