pub mod config;
pub mod env;
pub mod error;

pub use config::{Config, SchedulerConfig};
pub use env::{EnvDescr, ENVIRONMENTS_COUNT};
pub use error::*;
