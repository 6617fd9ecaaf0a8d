use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Top-level config ────────────────────────────────────────────────

/// Full configuration, usually read from `diffexec.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,

    /// Dispatcher pool and submission settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

// ── Section configs ─────────────────────────────────────────────────

/// Scheduler section: dispatcher pool sizing and wait behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of dispatcher threads. 0 = available parallelism.
    #[serde(default = "default_dispatchers")]
    pub dispatchers: usize,

    /// How long an idle dispatcher sleeps before re-checking the queue,
    /// unless woken earlier by a submission.
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,

    /// Default bound on waiting for an outcome. 0 = wait forever.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Priority given to submissions that don't pick one.
    #[serde(default = "default_priority")]
    pub default_priority: i32,
}

fn default_dispatchers() -> usize {
    0
}

fn default_idle_backoff_ms() -> u64 {
    100
}

fn default_task_timeout_secs() -> u64 {
    0
}

fn default_priority() -> i32 {
    0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dispatchers: default_dispatchers(),
            idle_backoff_ms: default_idle_backoff_ms(),
            task_timeout_secs: default_task_timeout_secs(),
            default_priority: default_priority(),
        }
    }
}

impl SchedulerConfig {
    /// Resolve dispatcher count (0 means use available parallelism).
    pub fn resolved_dispatchers(&self) -> usize {
        if self.dispatchers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.dispatchers
        }
    }

    /// Never below 1ms, even for configs built in code without `validate()`.
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms.max(1))
    }

    /// `None` when submitters should wait without a bound.
    pub fn task_timeout(&self) -> Option<Duration> {
        match self.task_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
