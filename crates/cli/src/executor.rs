use std::time::Duration;

use diffexec_queue::{Executor, WireTask};
use serde::Serialize;
use tracing::warn;

use crate::program::SyntheticProgram;

/// Per-task result produced by [`SimulatedExecutor`].
#[derive(Debug, Clone, Serialize)]
pub struct ExecOutcome {
    pub task_id: u64,
    /// One errno per call, 0 on success. Empty if the program didn't decode.
    pub errnos: Vec<i32>,
    pub decode_failed: bool,
}

impl ExecOutcome {
    pub fn failed_calls(&self) -> usize {
        self.errnos.iter().filter(|e| **e != 0).count()
    }
}

/// Stand-in for a real kernel executor: sleeps, then derives an errno for
/// each call from its name.
pub struct SimulatedExecutor {
    delay: Duration,
}

impl SimulatedExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn errno_for(call: &str, position: usize) -> i32 {
        match (call.len() + position) % 5 {
            0 => 22, // EINVAL
            1 => 9,  // EBADF
            _ => 0,
        }
    }
}

impl Executor<ExecOutcome> for SimulatedExecutor {
    fn name(&self) -> &str {
        "simulated"
    }

    fn execute(&self, task: &WireTask) -> ExecOutcome {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match task.decode_program::<SyntheticProgram>() {
            Ok(prog) => ExecOutcome {
                task_id: task.id,
                errnos: prog
                    .calls
                    .iter()
                    .enumerate()
                    .map(|(i, call)| Self::errno_for(call, i))
                    .collect(),
                decode_failed: false,
            },
            Err(e) => {
                warn!(task_id = task.id, error = %e, "program failed to decode");
                ExecOutcome {
                    task_id: task.id,
                    errnos: Vec::new(),
                    decode_failed: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_errno_per_call() {
        let prog = SyntheticProgram::generate(3);
        let wire = WireTask::new(12, &prog).unwrap();
        let outcome = SimulatedExecutor::new(Duration::ZERO).execute(&wire);
        assert_eq!(outcome.task_id, 12);
        assert_eq!(outcome.errnos.len(), prog.calls.len());
        assert!(!outcome.decode_failed);
    }

    #[test]
    fn undecodable_program_is_flagged() {
        let wire = WireTask::new(1, &42u8).unwrap();
        let outcome = SimulatedExecutor::new(Duration::ZERO).execute(&wire);
        assert!(outcome.decode_failed);
        assert_eq!(outcome.failed_calls(), 0);
    }
}
