//! Priority scheduler: admission, dispatch and outcome routing.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, submission and accessor methods
//! - `dispatch`: dispatcher loop on a thread pool and single-task dispatch
//! - `executor`: the trait external executors implement
//! - `submission`: submitter-side handle that cleans up its registry entry
//! - `metrics`: counters exposed to callers

mod core;
mod dispatch;
mod executor;
mod metrics;
mod submission;

pub use self::core::Scheduler;
pub use executor::Executor;
pub use metrics::SchedulerMetrics;
pub use submission::Submission;
