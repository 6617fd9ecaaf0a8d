use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::time::Duration;

use diffexec_core::{EnvDescr, SchedulerConfig};
use tracing::{debug, info};

use crate::correlator::ResultCorrelator;
use crate::error::QueueError;
use crate::factory::TaskFactory;
use crate::pqueue::ExecTaskQueue;
use crate::registry::TaskRegistry;
use crate::task::Priority;

use super::metrics::SchedulerMetrics;
use super::submission::Submission;

/// The execution scheduler. Owns the registry, the id factory and the
/// priority queue, and dispatches queued tasks to an
/// [`Executor`](super::Executor).
///
/// Share it between submitters and the dispatcher thread with an `Arc`.
#[derive(Debug)]
pub struct Scheduler<P, O> {
    pub(super) config: SchedulerConfig,
    pub(super) factory: TaskFactory<O>,
    pub(super) queue: ExecTaskQueue<P>,
    pub(super) correlator: ResultCorrelator<O>,
    pub(super) metrics: RwLock<SchedulerMetrics>,
    /// Shutdown signal.
    pub(super) shutdown: AtomicBool,
    /// Tasks currently inside an executor.
    pub(super) active: AtomicUsize,
    /// Set by a submission or a finished dispatch, cleared by the idle dispatcher.
    pub(super) wake_pending: Mutex<bool>,
    pub(super) wake: Condvar,
}

impl<P, O> Scheduler<P, O> {
    /// Create a scheduler with its own, empty registry.
    pub fn new(config: SchedulerConfig) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        Self {
            config,
            factory: TaskFactory::new(Arc::clone(&registry)),
            queue: ExecTaskQueue::new(),
            correlator: ResultCorrelator::new(registry),
            metrics: RwLock::new(SchedulerMetrics::default()),
            shutdown: AtomicBool::new(false),
            active: AtomicUsize::new(0),
            wake_pending: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    /// Admit `program` at `priority` for any environment.
    pub fn submit(&self, program: P, priority: Priority) -> Result<Submission<O>, QueueError> {
        self.submit_in(program, priority, EnvDescr::AnyEnvironment)
    }

    /// Admit `program` at the configured default priority.
    pub fn submit_default(&self, program: P) -> Result<Submission<O>, QueueError> {
        self.submit(program, self.config.default_priority)
    }

    /// Admit `program` tagged with an environment requirement.
    pub fn submit_in(
        &self,
        program: P,
        priority: Priority,
        env: EnvDescr,
    ) -> Result<Submission<O>, QueueError> {
        if self.is_shutdown() {
            return Err(QueueError::ShutDown);
        }

        let (task, receiver) = self.factory.create_task_in(program, priority, env)?;
        let submission = Submission::new(receiver, Arc::clone(self.factory.registry()));
        let id = task.id();

        self.queue.push(task);
        let depth = self.queue.len();
        if let Ok(mut m) = self.metrics.write() {
            m.record_submission(depth);
        }
        debug!(task_id = id, priority, queue_depth = depth, "task submitted");

        // Lost the race with a shutdown that already drained the queue.
        if self.is_shutdown() {
            self.abandon_queued();
        }

        self.notify_dispatcher();
        Ok(submission)
    }

    /// Drop every queued task. Their submitters see `QueueError::Abandoned`.
    pub fn abandon_queued(&self) -> usize {
        let drained = self.queue.drain();
        for task in &drained {
            self.factory.destroy_task(task);
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "abandoned queued tasks");
            if let Ok(mut m) = self.metrics.write() {
                m.record_abandoned(drained.len());
            }
        }
        drained.len()
    }

    /// Wake one idle dispatcher.
    pub(super) fn notify_dispatcher(&self) {
        let mut pending = self.wake_pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = true;
        self.wake.notify_one();
    }

    /// Sleep until notified or `timeout` passes.
    pub(super) fn wait_for_work(&self, timeout: Duration) {
        let mut pending = self.wake_pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !*pending {
            pending = self
                .wake
                .wait_timeout(pending, timeout)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
        *pending = false;
    }

    /// Signal the dispatcher loop to stop.
    pub fn shutdown(&self) {
        info!("Scheduler shutdown requested");
        self.shutdown.store(true, Ordering::Release);
        let mut pending = self.wake_pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = true;
        self.wake.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics
            .read()
            .map(|m| (*m).clone())
            .unwrap_or_else(|e| (*e.into_inner()).clone())
    }

    /// Advisory number of queued tasks.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Tasks currently inside the executor.
    pub fn active_dispatches(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn registry(&self) -> &Arc<TaskRegistry<O>> {
        self.factory.registry()
    }

    /// Correlator handle for delivering outcomes produced outside the
    /// dispatcher loop.
    pub fn correlator(&self) -> &ResultCorrelator<O> {
        &self.correlator
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Configured default wait bound for submitters.
    pub fn task_timeout(&self) -> Option<Duration> {
        self.config.task_timeout()
    }
}
