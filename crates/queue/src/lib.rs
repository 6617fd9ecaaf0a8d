pub mod completion;
pub mod correlator;
pub mod error;
pub mod factory;
pub mod pqueue;
pub mod registry;
pub mod scheduler;
pub mod task;
pub mod wire;

pub use completion::{ResultReceiver, ResultSender};
pub use correlator::{Delivery, ResultCorrelator};
pub use error::QueueError;
pub use factory::TaskFactory;
pub use pqueue::ExecTaskQueue;
pub use registry::TaskRegistry;
pub use scheduler::{Executor, Scheduler, SchedulerMetrics, Submission};
pub use task::{ExecTask, Priority, TaskId};
pub use wire::WireTask;
