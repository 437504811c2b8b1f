//! Progress state: the loop's durable cross-session memory.
//!
//! A single [`ProgressState`] aggregate holds the current task, the
//! executor's working context, the next-action hint, progress counters and
//! a bounded checkpoint ring. It is created empty on first access, mutated
//! by task-list synchronization and by the executor's own progress/failure
//! reports, and never deleted.
//!
//! Synchronization is the only path that resets `retry_count`: when the
//! next actionable task's id differs from `current_task.id`, the record is
//! replaced wholesale. Renaming a task mid-flight therefore loses its
//! retry history; the synchronizer cannot tell a renamed task from a new
//! one, and does not try to.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

use crate::tasklist::TaskList;

/// Status value for a finished task list.
pub const STATUS_ALL_COMPLETED: &str = "ALL_COMPLETED";

fn default_max_retries() -> u32 {
    5
}

// ============================================================================
// Aggregate parts
// ============================================================================

/// The task the loop is currently driving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTask {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for CurrentTask {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            status: String::new(),
            retry_count: 0,
            max_retries: default_max_retries(),
            started_at: None,
        }
    }
}

impl CurrentTask {
    /// Display label: id when known, `(none)` otherwise.
    #[must_use]
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("(none)")
    }
}

/// Fine-grained executor context, written back by the executor itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingContext {
    pub current_file: Option<String>,
    pub current_function: Option<String>,
    #[serde(default)]
    pub pending_tests: Vec<String>,
    #[serde(default)]
    pub pending_implementations: Vec<String>,
}

/// Hint for what the executor should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAction {
    pub action: String,
    pub target: Option<String>,
    pub reason: Option<String>,
}

impl Default for NextAction {
    fn default() -> Self {
        Self {
            action: "INITIALIZE".to_string(),
            target: Some("Create the task list".to_string()),
            reason: Some("No task list has been synchronized yet".to_string()),
        }
    }
}

/// Progress counters, recomputed from the task list on every sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounters {
    #[serde(default)]
    pub completed: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub pending: usize,
    #[serde(default)]
    pub in_progress: usize,
    pub current_phase: Option<String>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl ProgressCounters {
    /// Progress rendered as `completed/total`.
    #[must_use]
    pub fn fraction(&self) -> String {
        format!("{}/{}", self.completed, self.total)
    }
}

/// One checkpoint in the bounded ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub detail: String,
}

// ============================================================================
// Progress state
// ============================================================================

/// The single persisted aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressState {
    pub current_task: CurrentTask,
    pub working_context: WorkingContext,
    pub next_action: NextAction,
    pub progress: ProgressCounters,
    /// Bounded ring, oldest first; capacity enforced on push
    pub checkpoints: VecDeque<Checkpoint>,
    /// Files the executor considers active, for briefing assembly
    pub active_files: Vec<String>,
    /// Hash of the last synchronized task-list generation
    pub list_hash: String,
}

impl ProgressState {
    /// Create the empty "uninitialized" state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no sync has ever populated this state.
    #[must_use]
    pub fn is_uninitialized(&self) -> bool {
        self.list_hash.is_empty() && self.progress.total == 0
    }

    /// Synchronize counters and the current task from a parsed task list.
    ///
    /// Counters always obey `completed + pending + in_progress == total`
    /// afterwards. The current task is replaced (fresh retry accounting)
    /// only when the next actionable id differs from the stored one;
    /// re-syncing the same id never resets `retry_count`.
    pub fn sync_with_list(&mut self, list: &TaskList, max_retries: u32, now: DateTime<Utc>) {
        self.progress.completed = list.completed.len();
        self.progress.pending = list.pending.len();
        self.progress.in_progress = list.in_progress.len();
        self.progress.total = list.total();
        self.progress.current_phase = list.current_phase.clone();
        self.progress.last_synced = Some(now);
        self.list_hash = list.list_hash.clone();

        match list.next_task() {
            Some(item) => {
                let key = item.key();
                let in_progress = item.status == crate::tasklist::TaskStatus::InProgress;

                if self.current_task.id.as_deref() != Some(key.as_str()) {
                    // Task changed: fresh record, retry history starts over.
                    tracing::info!(task = %key, "current task updated by sync");
                    self.current_task = CurrentTask {
                        id: Some(key.clone()),
                        name: Some(item.name()),
                        status: item.status.to_string(),
                        retry_count: 0,
                        max_retries,
                        started_at: in_progress.then_some(now),
                    };
                    self.next_action = NextAction {
                        action: "EXECUTE".to_string(),
                        target: Some(key),
                        reason: Some("Next actionable task from the list".to_string()),
                    };
                } else {
                    // Same task: refresh status without touching retries.
                    self.current_task.name = Some(item.name());
                    self.current_task.status = item.status.to_string();
                    if in_progress && self.current_task.started_at.is_none() {
                        self.current_task.started_at = Some(now);
                    }
                }
            }
            None if list.is_complete() => {
                // Terminal for this list generation; a later sync that
                // reintroduces work replaces current_task above.
                if self.current_task.status != STATUS_ALL_COMPLETED {
                    tracing::info!("all tasks completed");
                }
                self.current_task.id = None;
                self.current_task.status = STATUS_ALL_COMPLETED.to_string();
                self.next_action = NextAction {
                    action: "FINALIZE".to_string(),
                    target: Some("Generate completion report".to_string()),
                    reason: Some("All tasks in the list are completed".to_string()),
                };
            }
            None => {
                // Present but empty: counters are zeroed, nothing else to do.
            }
        }
    }

    /// Record an executor failure against the current task.
    ///
    /// Saturating; exceeding `max_retries` is a stuck-detector signal, not
    /// a write constraint.
    pub fn record_failure(&mut self) {
        self.current_task.retry_count = self.current_task.retry_count.saturating_add(1);
    }

    /// Push a checkpoint, evicting the oldest entry beyond `capacity`.
    pub fn push_checkpoint(
        &mut self,
        action: impl Into<String>,
        detail: impl Into<String>,
        now: DateTime<Utc>,
        capacity: usize,
    ) {
        self.checkpoints.push_back(Checkpoint {
            timestamp: now,
            action: action.into(),
            detail: detail.into(),
        });
        while self.checkpoints.len() > capacity {
            self.checkpoints.pop_front();
        }
    }
}

// ============================================================================
// Decision log
// ============================================================================

/// Append a timestamped line to the free-form decision log.
///
/// # Errors
///
/// Returns an error if the file cannot be created or appended.
pub fn log_decision(path: &Path, message: &str) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "[{}] {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), message)
}
