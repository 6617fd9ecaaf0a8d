//! Runtime configuration for the scheduler and the binaries built on it.
//!
//! Parsed from TOML, then overridden by `DIFFEXEC_*` environment variables.

mod loading;
mod types;

pub use loading::load_dotenv;
pub use types::{Config, SchedulerConfig};
