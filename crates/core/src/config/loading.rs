use std::path::Path;

use crate::error::CoreError;

use super::types::Config;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

impl Config {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, CoreError> {
        Self::from_toml_with(toml_str, env_opt)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        Self::from_file_with(path, env_opt)
    }

    /// Parse `toml_str`, taking overrides from `lookup` instead of the
    /// process environment.
    pub(crate) fn from_toml_with(
        toml_str: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CoreError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_overrides(lookup);
        config.finish()
    }

    pub(crate) fn from_file_with(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_with(&content, lookup)
    }

    /// Normalize, then validate.
    fn finish(mut self) -> Result<Self, CoreError> {
        self.profile = self.profile.trim().to_uppercase();
        self.validate()?;
        Ok(self)
    }

    /// Build config from the environment (call `load_dotenv()` first).
    ///
    /// Reads the file named by `DIFFEXEC_CONFIG` when set, otherwise starts
    /// from defaults. Overrides are applied either way.
    pub fn from_env() -> Result<Self, CoreError> {
        match env_opt("DIFFEXEC_CONFIG") {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.apply_overrides(env_opt);
                config.finish()
            }
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Convention: `DIFFEXEC_SECTION_KEY` overrides `section.key`.
    /// - `DIFFEXEC_PROFILE` -> `profile`
    /// - `DIFFEXEC_SCHEDULER_DISPATCHERS` -> `scheduler.dispatchers`
    /// - `DIFFEXEC_SCHEDULER_IDLE_BACKOFF_MS` -> `scheduler.idle_backoff_ms`
    /// - `DIFFEXEC_SCHEDULER_TASK_TIMEOUT_SECS` -> `scheduler.task_timeout_secs`
    /// - `DIFFEXEC_SCHEDULER_DEFAULT_PRIORITY` -> `scheduler.default_priority`
    ///
    /// Unparseable numeric values are ignored. Profiles are upper-cased
    /// whichever source they come from.
    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("DIFFEXEC_PROFILE") {
            self.profile = v;
        }
        if let Some(n) = lookup("DIFFEXEC_SCHEDULER_DISPATCHERS").and_then(|v| v.parse().ok()) {
            self.scheduler.dispatchers = n;
        }
        if let Some(ms) =
            lookup("DIFFEXEC_SCHEDULER_IDLE_BACKOFF_MS").and_then(|v| v.parse().ok())
        {
            self.scheduler.idle_backoff_ms = ms;
        }
        if let Some(secs) =
            lookup("DIFFEXEC_SCHEDULER_TASK_TIMEOUT_SECS").and_then(|v| v.parse().ok())
        {
            self.scheduler.task_timeout_secs = secs;
        }
        if let Some(p) =
            lookup("DIFFEXEC_SCHEDULER_DEFAULT_PRIORITY").and_then(|v| v.parse().ok())
        {
            self.scheduler.default_priority = p;
        }
    }

    /// Validate values that have no sensible interpretation.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.scheduler.idle_backoff_ms == 0 {
            return Err(CoreError::Config(
                "scheduler.idle_backoff_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  scheduler:   dispatchers={}, idle_backoff={}ms, task_timeout={}",
            self.scheduler.resolved_dispatchers(),
            self.scheduler.idle_backoff_ms,
            match self.scheduler.task_timeout() {
                Some(t) => format!("{}s", t.as_secs()),
                None => "none".to_string(),
            }
        );
    }

    /// JSON view for status output.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "scheduler": {
                "dispatchers": self.scheduler.resolved_dispatchers(),
                "idle_backoff_ms": self.scheduler.idle_backoff_ms,
                "task_timeout_secs": self.scheduler.task_timeout_secs,
                "default_priority": self.scheduler.default_priority,
            },
        })
    }
}
