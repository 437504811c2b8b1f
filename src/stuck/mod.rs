//! Stuck-loop detection.
//!
//! Pure read-only analysis over the current task and the failure log.
//! Three signals checked in strict priority order, first hit wins:
//!
//! 1. retry budget exceeded on the current task
//! 2. too many unresolved failures on the current task
//! 3. unresolved failures saturating the recent global window
//!
//! Detection never mutates anything; the controller decides what to do
//! with a positive report.

use serde::{Deserialize, Serialize};

use crate::config::StuckThresholds;
use crate::errorlog::ErrorLog;
use crate::state::CurrentTask;

/// Which signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StuckKind {
    /// Current task retried at or past its budget
    RetryBudget,
    /// Unresolved failure count on the current task hit the limit
    TaskErrors,
    /// The recent window is entirely unresolved failures
    GlobalErrors,
}

/// A positive stuck verdict with a human-readable diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StuckReport {
    pub kind: StuckKind,
    pub reason: String,
    pub suggestion: String,
}

/// Run the three checks in priority order. The two per-task signals only
/// apply while a task id is active.
#[must_use]
pub fn detect(
    task: &CurrentTask,
    errors: &ErrorLog,
    thresholds: &StuckThresholds,
) -> Option<StuckReport> {
    if let Some(id) = task.id.as_deref() {
        if task.retry_count >= task.max_retries {
            return Some(StuckReport {
                kind: StuckKind::RetryBudget,
                reason: format!(
                    "task {} has been retried {} times (budget {})",
                    id, task.retry_count, task.max_retries
                ),
                suggestion: "try a fundamentally different approach, or skip this task and move on"
                    .to_string(),
            });
        }

        let unresolved = errors.count_unresolved(id);
        if unresolved >= thresholds.task_error_limit {
            return Some(StuckReport {
                kind: StuckKind::TaskErrors,
                reason: format!("{} unresolved errors recorded against task {}", unresolved, id),
                suggestion:
                    "review the repeating error pattern and consider an alternative implementation"
                        .to_string(),
            });
        }
    }

    let window = thresholds.error_window;
    if window > 0 && errors.len() >= window && errors.count_unresolved_in_window(window) >= window {
        return Some(StuckReport {
            kind: StuckKind::GlobalErrors,
            reason: format!("the last {} recorded errors are all unresolved", window),
            suggestion: "escalate for human intervention or reset the environment".to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, retries: u32) -> CurrentTask {
        CurrentTask {
            id: Some(id.to_string()),
            name: Some(format!("Task {}", id)),
            status: "IN_PROGRESS".to_string(),
            retry_count: retries,
            max_retries: 5,
            started_at: Some(Utc::now()),
        }
    }

    fn thresholds() -> StuckThresholds {
        StuckThresholds::default()
    }

    #[test]
    fn test_healthy_state_is_not_stuck() {
        let errors = ErrorLog::new(50);
        let t = task("TASK-001", 2);
        assert!(detect(&t, &errors, &thresholds()).is_none());
    }

    #[test]
    fn test_retry_budget_fires_at_limit() {
        let errors = ErrorLog::new(50);
        let t = task("TASK-001", 5);
        let report = detect(&t, &errors, &thresholds()).unwrap();
        assert_eq!(report.kind, StuckKind::RetryBudget);
        assert!(report.reason.contains("retried 5 times"));
    }

    #[test]
    fn test_no_active_task_skips_retry_check() {
        let errors = ErrorLog::new(50);
        let mut t = task("TASK-001", 9);
        t.id = None;
        assert!(detect(&t, &errors, &thresholds()).is_none());
    }

    #[test]
    fn test_task_errors_fire_at_limit() {
        let mut errors = ErrorLog::new(50);
        for _ in 0..3 {
            errors.record("TASK-001", "compile error", None, Utc::now());
        }
        let t = task("TASK-001", 1);
        let report = detect(&t, &errors, &thresholds()).unwrap();
        assert_eq!(report.kind, StuckKind::TaskErrors);
    }

    #[test]
    fn test_resolved_errors_do_not_count() {
        let mut errors = ErrorLog::new(50);
        for _ in 0..3 {
            errors.record("TASK-001", "compile error", None, Utc::now());
        }
        errors.resolve("TASK-001", "fixed", Utc::now());
        let t = task("TASK-001", 1);
        assert!(detect(&t, &errors, &thresholds()).is_none());
    }

    #[test]
    fn test_retry_budget_beats_task_errors() {
        let mut errors = ErrorLog::new(50);
        for _ in 0..4 {
            errors.record("TASK-001", "boom", None, Utc::now());
        }
        let t = task("TASK-001", 6);
        let report = detect(&t, &errors, &thresholds()).unwrap();
        assert_eq!(report.kind, StuckKind::RetryBudget);
    }

    #[test]
    fn test_global_window_fires_without_active_task() {
        let mut errors = ErrorLog::new(50);
        for i in 0..10 {
            errors.record(format!("TASK-{:03}", i), "boom", None, Utc::now());
        }
        let report = detect(&CurrentTask::default(), &errors, &thresholds()).unwrap();
        assert_eq!(report.kind, StuckKind::GlobalErrors);
    }

    #[test]
    fn test_one_resolved_breaks_the_window() {
        let mut errors = ErrorLog::new(50);
        for i in 0..10 {
            errors.record(format!("TASK-{:03}", i), "boom", None, Utc::now());
        }
        errors.resolve("TASK-005", "fixed", Utc::now());
        assert!(detect(&CurrentTask::default(), &errors, &thresholds()).is_none());
    }

    #[test]
    fn test_short_log_never_saturates_window() {
        let mut errors = ErrorLog::new(50);
        for i in 0..9 {
            errors.record(format!("TASK-{:03}", i), "boom", None, Utc::now());
        }
        assert!(detect(&CurrentTask::default(), &errors, &thresholds()).is_none());
    }
}
