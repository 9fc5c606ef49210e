use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::LongRunError;

/// Durable per-job-type settings.
///
/// Persisted as a single JSON record under the `<JobType>Settings` key using
/// the camelCase field names below. Keys missing from a persisted record fall
/// back to the built-in defaults, so older records keep working when new
/// options are introduced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSettings {
    /// Total number of iterations the job runs, counted from 1.
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Per-invocation time budget. A slice suspends once it has consumed at
    /// least this many seconds.
    #[serde(default = "default_max_execution_seconds")]
    pub max_execution_seconds: u64,
    /// How far in the future the resume trigger is armed.
    #[serde(default = "default_delay_minutes")]
    pub delay_minutes: u64,
    /// Registry name of the worker hook, called once per iteration.
    #[serde(default)]
    pub main_process: String,
    /// Registry name of the optional pre-loop hook. Empty means none.
    #[serde(default)]
    pub initializer: String,
    /// Registry name of the optional post-completion hook. Empty means none.
    #[serde(default)]
    pub finalizer: String,
    /// Opaque payload forwarded to every hook.
    #[serde(default)]
    pub args: String,
}

fn default_iterations() -> u64 {
    1
}

fn default_max_execution_seconds() -> u64 {
    4 * 60
}

fn default_delay_minutes() -> u64 {
    1
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            max_execution_seconds: default_max_execution_seconds(),
            delay_minutes: default_delay_minutes(),
            main_process: String::new(),
            initializer: String::new(),
            finalizer: String::new(),
            args: String::new(),
        }
    }
}

impl JobSettings {
    /// Parse a persisted settings record; `None` yields the defaults.
    pub fn from_persisted(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(json) => {
                let settings = serde_json::from_str(json)
                    .map_err(|e| LongRunError::Storage(format!("invalid settings record: {e}")))?;
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply a caller-supplied override layer. Present fields win.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(iterations) = patch.iterations {
            self.iterations = iterations;
        }
        if let Some(max_execution_seconds) = patch.max_execution_seconds {
            self.max_execution_seconds = max_execution_seconds;
        }
        if let Some(delay_minutes) = patch.delay_minutes {
            self.delay_minutes = delay_minutes;
        }
        if let Some(ref main_process) = patch.main_process {
            self.main_process = main_process.clone();
        }
        if let Some(ref initializer) = patch.initializer {
            self.initializer = initializer.clone();
        }
        if let Some(ref finalizer) = patch.finalizer {
            self.finalizer = finalizer.clone();
        }
        if let Some(ref args) = patch.args {
            self.args = args.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(
                LongRunError::Validation("iterations must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }
}

/// Caller-supplied settings overrides.
///
/// Every field is optional; absent fields defer to whatever is already
/// persisted (or the defaults on a fresh job type).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub iterations: Option<u64>,
    pub max_execution_seconds: Option<u64>,
    pub delay_minutes: Option<u64>,
    pub main_process: Option<String>,
    pub initializer: Option<String>,
    pub finalizer: Option<String>,
    pub args: Option<String>,
}
