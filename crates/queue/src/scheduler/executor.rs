use crate::wire::WireTask;

/// Runs a task and produces its outcome.
///
/// Implementations wrap whatever actually executes programs (a VM pool, a
/// local sandbox, a simulator). They only ever see the wire form; the
/// scheduler correlates the returned outcome with the task id.
pub trait Executor<O>: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Execute one task. Called concurrently from dispatcher threads.
    fn execute(&self, task: &WireTask) -> O;
}
