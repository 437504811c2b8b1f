//! Configuration for the loopkeeper workspace.
//!
//! Everything lives under a single `LoopConfig`: file locations, the
//! stuck-detection thresholds, and the briefing budgets. Configuration is
//! loaded from `.loopkeeper/config.toml` when present and falls back to
//! defaults otherwise; a missing config file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LoopkeeperError, Result};

/// Directory (relative to the project root) holding all persisted records.
pub const STATE_DIR: &str = ".loopkeeper";

/// Default directories excluded from the project-structure digest.
pub fn default_ignore_dirs() -> Vec<&'static str> {
    vec![
        "node_modules",
        "target",
        ".venv",
        "__pycache__",
        "dist",
        "build",
        "out",
        "vendor",
        ".git",
        ".hg",
        ".svn",
        ".loopkeeper",
        "coverage",
        ".pytest_cache",
        ".mypy_cache",
        ".ruff_cache",
    ]
}

/// What to do when a persisted structured record fails to parse.
///
/// The loop historically swallowed corruption and continued on defaults;
/// that is still the default here, but operators who would rather halt on
/// a corrupt record can opt into `Surface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Fall back to an empty/default value and keep the loop alive
    #[default]
    UseDefault,
    /// Return the parse error to the caller
    Surface,
}

/// Thresholds consumed by the stuck detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StuckThresholds {
    /// Retry budget per task before the detector fires
    pub max_retries: u32,
    /// Unresolved errors on the current task before the detector fires
    pub task_error_limit: usize,
    /// Trailing-window size for the global consecutive-error check
    pub error_window: usize,
}

impl Default for StuckThresholds {
    fn default() -> Self {
        Self {
            max_retries: 5,
            task_error_limit: 3,
            error_window: 10,
        }
    }
}

/// Character budgets for briefing assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefingBudgets {
    /// Total budget for the `full` profile
    pub full: usize,
    /// Total budget for the `review` profile
    pub review: usize,
    /// Total budget for the `task` profile
    pub task: usize,
    /// Per-section cap applied to embedded free text (file contents, logs)
    pub section: usize,
}

impl Default for BriefingBudgets {
    fn default() -> Self {
        Self {
            full: 48_000,
            review: 24_000,
            task: 12_000,
            section: 8_000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Task list document, relative to the project root
    pub task_list: PathBuf,
    /// Directory of task detail documents (`<dir>/<ID>.md`)
    pub task_dir: PathBuf,
    /// External contract/spec document included in briefings
    pub contract: PathBuf,
    /// Stuck-detection thresholds
    pub thresholds: StuckThresholds,
    /// Briefing character budgets
    pub budgets: BriefingBudgets,
    /// Policy for malformed persisted records
    pub on_malformed: MalformedPolicy,
    /// Bounded timeout for external tool invocations (git), in seconds
    pub tool_timeout_secs: u64,
    /// Error log capacity (oldest-first eviction)
    pub error_log_capacity: usize,
    /// Checkpoint ring capacity
    pub checkpoint_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            task_list: PathBuf::from("TASKS.md"),
            task_dir: PathBuf::from("tasks"),
            contract: PathBuf::from("CONTRACT.md"),
            thresholds: StuckThresholds::default(),
            budgets: BriefingBudgets::default(),
            on_malformed: MalformedPolicy::default(),
            tool_timeout_secs: 3,
            error_log_capacity: 50,
            checkpoint_capacity: 20,
        }
    }
}

impl LoopConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration for a project root.
    ///
    /// Reads `.loopkeeper/config.toml` if it exists; otherwise returns
    /// defaults. A present-but-invalid file is a hard error regardless of
    /// `on_malformed`; the operator wrote it, the operator should fix it.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(STATE_DIR).join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| LoopkeeperError::config_with_path(e.to_string(), path.clone()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LoopkeeperError::config_with_path(e.to_string(), path.clone()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configured values.
    ///
    /// # Errors
    ///
    /// Returns an error for zero capacities or a zero tool timeout.
    pub fn validate(&self) -> Result<()> {
        if self.error_log_capacity == 0 {
            return Err(LoopkeeperError::InvalidConfig {
                field: "error_log_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.checkpoint_capacity == 0 {
            return Err(LoopkeeperError::InvalidConfig {
                field: "checkpoint_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.tool_timeout_secs == 0 {
            return Err(LoopkeeperError::InvalidConfig {
                field: "tool_timeout_secs".into(),
                reason: "external tools need a non-zero timeout".into(),
            });
        }
        if self.thresholds.error_window == 0 {
            return Err(LoopkeeperError::InvalidConfig {
                field: "thresholds.error_window".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Set the retry budget per task.
    #[must_use]
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.thresholds.max_retries = max;
        self
    }

    /// Set the task list path.
    #[must_use]
    pub fn with_task_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.task_list = path.into();
        self
    }

    /// Set the malformed-record policy.
    #[must_use]
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    /// Set the external-tool timeout.
    #[must_use]
    pub fn with_tool_timeout_secs(mut self, secs: u64) -> Self {
        self.tool_timeout_secs = secs;
        self
    }

    /// Absolute path to the state directory for a project root.
    #[must_use]
    pub fn state_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(STATE_DIR)
    }

    /// Absolute path to the progress-state record.
    #[must_use]
    pub fn state_path(&self, project_root: &Path) -> PathBuf {
        self.state_dir(project_root).join("state.json")
    }

    /// Absolute path to the error-log record.
    #[must_use]
    pub fn errors_path(&self, project_root: &Path) -> PathBuf {
        self.state_dir(project_root).join("errors.json")
    }

    /// Absolute path to the decision log.
    #[must_use]
    pub fn decisions_path(&self, project_root: &Path) -> PathBuf {
        self.state_dir(project_root).join("decisions.log")
    }

    /// Absolute path to the task list document.
    #[must_use]
    pub fn task_list_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.task_list)
    }

    /// Absolute path to a task detail document.
    #[must_use]
    pub fn task_detail_path(&self, project_root: &Path, task_id: &str) -> PathBuf {
        // Positional ids (`@N`) have no detail document; the '@' never
        // appears in a filename we would find anyway.
        project_root
            .join(&self.task_dir)
            .join(format!("{}.md", task_id.trim_start_matches('#')))
    }

    /// Absolute path to the contract document.
    #[must_use]
    pub fn contract_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.contract)
    }
}
