//! Bounded, append-only failure log.
//!
//! Every failure report appends a record; the log never rejects a write
//! and never grows past its capacity (oldest-first eviction, default 50).
//! Records are mutated exactly once, at resolution, and are otherwise
//! immutable. Resolution targets the most recent unresolved record for the
//! task; last-writer-wins, on the theory that the failure the executor
//! just fixed is the one it hit last.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

use crate::config::MalformedPolicy;
use crate::error::{LoopkeeperError, Result};

/// One failure event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub task_id: String,
    pub error: String,
    pub attempted_fix: Option<String>,
    /// `None` means unresolved
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ErrorRecord {
    /// True when no resolution has been recorded.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Outcome of a resolve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The most recent unresolved record for the task was updated
    Resolved,
    /// No unresolved record matched; nothing was mutated
    NotFound,
}

/// The bounded failure log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLog {
    records: VecDeque<ErrorRecord>,
    capacity: usize,
}

impl ErrorLog {
    /// Create an empty log with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
        }
    }

    /// Append a failure record. Always succeeds; evicts the oldest record
    /// when full.
    pub fn record(
        &mut self,
        task_id: impl Into<String>,
        error: impl Into<String>,
        attempted_fix: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.records.push_back(ErrorRecord {
            timestamp: now,
            task_id: task_id.into(),
            error: error.into(),
            attempted_fix,
            resolution: None,
            resolved_at: None,
        });
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Resolve the most recent unresolved record matching `task_id`.
    ///
    /// Best-effort: with no match this is a no-op reporting `NotFound`, so
    /// double-resolve and resolve-before-record races never crash the loop.
    pub fn resolve(
        &mut self,
        task_id: &str,
        resolution: impl Into<String>,
        now: DateTime<Utc>,
    ) -> ResolveOutcome {
        match self
            .records
            .iter_mut()
            .rev()
            .find(|r| r.task_id == task_id && r.is_unresolved())
        {
            Some(record) => {
                record.resolution = Some(resolution.into());
                record.resolved_at = Some(now);
                ResolveOutcome::Resolved
            }
            None => ResolveOutcome::NotFound,
        }
    }

    /// Number of records in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the log holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    /// Unresolved records for the given task, oldest first.
    pub fn unresolved_for<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a ErrorRecord> {
        self.records
            .iter()
            .filter(move |r| r.task_id == task_id && r.is_unresolved())
    }

    /// Count of unresolved records for the given task.
    #[must_use]
    pub fn count_unresolved(&self, task_id: &str) -> usize {
        self.unresolved_for(task_id).count()
    }

    /// Count of unresolved records among the last `n` records, regardless
    /// of task.
    #[must_use]
    pub fn count_unresolved_in_window(&self, n: usize) -> usize {
        self.records
            .iter()
            .rev()
            .take(n)
            .filter(|r| r.is_unresolved())
            .count()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Load the log from a JSON array file. A missing file yields an empty
    /// log; a malformed one follows `policy`.
    ///
    /// # Errors
    ///
    /// Returns an error on read failure, or on parse failure with
    /// `MalformedPolicy::Surface`.
    pub fn load(path: &Path, capacity: usize, policy: MalformedPolicy) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(capacity));
        }

        let content = std::fs::read_to_string(path)?;
        let records: Vec<ErrorRecord> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => match policy {
                MalformedPolicy::UseDefault => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "error log malformed, starting empty"
                    );
                    Vec::new()
                }
                MalformedPolicy::Surface => {
                    return Err(LoopkeeperError::CorruptState {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })
                }
            },
        };

        let mut log = Self::new(capacity);
        log.records = records.into_iter().collect();
        while log.records.len() > log.capacity {
            log.records.pop_front();
        }
        Ok(log)
    }

    /// Save the log as a JSON array, replacing the previous file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let records: Vec<&ErrorRecord> = self.records.iter().collect();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
