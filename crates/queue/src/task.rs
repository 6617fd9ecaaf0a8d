//! The unit of work moved through the scheduler.

use chrono::{DateTime, Utc};
use serde::Serialize;

use diffexec_core::EnvDescr;

use crate::error::QueueError;
use crate::wire::WireTask;

/// Process-unique task identifier, handed out by [`TaskFactory`](crate::TaskFactory).
pub type TaskId = u64;

/// Dispatch ordering key. Higher values run first.
pub type Priority = i32;

/// A candidate program admitted for execution.
///
/// Everything except `queue_index` is fixed at construction. The queue index
/// is bookkeeping owned by [`ExecTaskQueue`](crate::ExecTaskQueue) and is
/// `None` whenever the task is not queued.
#[derive(Debug)]
pub struct ExecTask<P> {
    id: TaskId,
    program: P,
    priority: Priority,
    creation_time: DateTime<Utc>,
    env: EnvDescr,
    pub(crate) queue_index: Option<usize>,
}

impl<P> ExecTask<P> {
    pub(crate) fn new(id: TaskId, program: P, priority: Priority, env: EnvDescr) -> Self {
        Self {
            id,
            program,
            priority,
            creation_time: Utc::now(),
            env,
            queue_index: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    /// Time since creation, clamped at zero if the wall clock stepped back.
    pub fn age(&self) -> std::time::Duration {
        Utc::now()
            .signed_duration_since(self.creation_time)
            .to_std()
            .unwrap_or_default()
    }

    pub fn env(&self) -> EnvDescr {
        self.env
    }

    /// Position in the priority queue, `None` when not queued.
    pub fn queue_index(&self) -> Option<usize> {
        self.queue_index
    }
}

impl<P: Serialize> ExecTask<P> {
    /// Build the transport form: serialized program and id only.
    pub fn to_wire(&self) -> Result<WireTask, QueueError> {
        WireTask::new(self.id, &self.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_not_queued() {
        let task = ExecTask::new(3, "prog", 7, EnvDescr::default());
        assert_eq!(task.id(), 3);
        assert_eq!(task.priority(), 7);
        assert_eq!(task.queue_index(), None);
        assert_eq!(task.env(), EnvDescr::AnyEnvironment);
        assert!(task.creation_time() <= Utc::now());
    }

    #[test]
    fn wire_form_carries_only_id_and_program() {
        let task = ExecTask::new(11, vec!["open".to_string(), "read".to_string()], 99, EnvDescr::NewEnvironment);
        let wire = task.to_wire().unwrap();
        assert_eq!(wire.id, 11);
        let prog: Vec<String> = wire.decode_program().unwrap();
        assert_eq!(prog, vec!["open", "read"]);
    }
}
