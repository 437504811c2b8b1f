//! Loop control: phase derivation and continue/stop decisions.
//!
//! The phase is never persisted; it is derived fresh on every call from
//! the task list, the progress state and the failure log, in strict
//! priority order:
//!
//! 1. `Uninitialized`: no task list, or a list with no tasks
//! 2. `Complete`: every task in the list is completed
//! 3. `Stuck`: a stuck signal fired
//! 4. `Active`: work remains
//!
//! Completion outranks stuck on purpose: a loop whose last task limped
//! over the line with a saturated error window is still done.
//!
//! Two consumers read the phase through different verdict surfaces:
//! [`decide`] drives the outer scheduler (should another iteration run),
//! [`gate_stop`] answers an executor that wants to stop (may it).

use serde::{Deserialize, Serialize};

use crate::config::StuckThresholds;
use crate::errorlog::ErrorLog;
use crate::state::ProgressState;
use crate::stuck::{self, StuckReport};
use crate::tasklist::TaskListSource;

// ============================================================================
// Phase
// ============================================================================

/// Derived loop phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    Uninitialized,
    Active,
    Stuck,
    Complete,
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Stuck => write!(f, "STUCK"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// A full phase assessment: the phase plus everything needed to phrase a
/// decision about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub phase: LoopPhase,
    /// Populated iff the phase is `Stuck`
    pub stuck: Option<StuckReport>,
    /// Pending plus in-progress tasks
    pub remaining: usize,
    /// Progress rendered `completed/total`
    pub progress: String,
}

/// Derive the current phase from all loop inputs.
#[must_use]
pub fn assess(
    source: &TaskListSource,
    state: &ProgressState,
    errors: &ErrorLog,
    thresholds: &StuckThresholds,
) -> Assessment {
    let progress = state.progress.fraction();

    let Some(list) = source.list() else {
        return Assessment {
            phase: LoopPhase::Uninitialized,
            stuck: None,
            remaining: 0,
            progress,
        };
    };

    if list.is_empty() {
        // A list with no recognized tasks defines no work either.
        return Assessment {
            phase: LoopPhase::Uninitialized,
            stuck: None,
            remaining: 0,
            progress,
        };
    }

    let remaining = list.pending.len() + list.in_progress.len();

    if list.is_complete() {
        return Assessment {
            phase: LoopPhase::Complete,
            stuck: None,
            remaining: 0,
            progress,
        };
    }

    if let Some(report) = stuck::detect(&state.current_task, errors, thresholds) {
        return Assessment {
            phase: LoopPhase::Stuck,
            stuck: Some(report),
            remaining,
            progress,
        };
    }

    Assessment {
        phase: LoopPhase::Active,
        stuck: None,
        remaining,
        progress,
    }
}

// ============================================================================
// Decisions
// ============================================================================

/// Verdict for the outer scheduler or the stop gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Run another iteration
    Continue,
    /// The executor may not stop yet
    Block,
    /// Halt the loop for intervention
    Stop,
    /// Nothing left to drive; stopping is fine
    Allow,
}

/// A decision with its derivation, serialized as the tool's JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopDecision {
    pub phase: LoopPhase,
    pub decision: Verdict,
    pub reason: String,
}

/// Scheduler-facing decision: should another iteration run?
#[must_use]
pub fn decide(assessment: &Assessment) -> LoopDecision {
    let (decision, reason) = match assessment.phase {
        LoopPhase::Active => (
            Verdict::Continue,
            format!(
                "{} tasks remaining (progress {})",
                assessment.remaining, assessment.progress
            ),
        ),
        LoopPhase::Stuck => (Verdict::Stop, stuck_reason(assessment)),
        LoopPhase::Complete => (
            Verdict::Allow,
            format!("all tasks completed ({})", assessment.progress),
        ),
        LoopPhase::Uninitialized => (
            Verdict::Allow,
            format!(
                "no tasks defined; nothing to drive (progress {})",
                assessment.progress
            ),
        ),
    };
    LoopDecision {
        phase: assessment.phase,
        decision,
        reason,
    }
}

/// Stop-gate decision: the executor announced it wants to stop.
#[must_use]
pub fn gate_stop(assessment: &Assessment) -> LoopDecision {
    let (decision, reason) = match assessment.phase {
        LoopPhase::Active => (
            Verdict::Block,
            format!(
                "{} tasks remaining (progress {}); keep going",
                assessment.remaining, assessment.progress
            ),
        ),
        LoopPhase::Stuck => (Verdict::Stop, stuck_reason(assessment)),
        LoopPhase::Complete => (
            Verdict::Allow,
            format!("all tasks completed ({})", assessment.progress),
        ),
        LoopPhase::Uninitialized => (
            Verdict::Allow,
            format!(
                "no tasks defined; nothing to drive (progress {})",
                assessment.progress
            ),
        ),
    };
    LoopDecision {
        phase: assessment.phase,
        decision,
        reason,
    }
}

fn stuck_reason(assessment: &Assessment) -> String {
    match &assessment.stuck {
        Some(report) => format!(
            "stuck at {}: {}. Suggestion: {}",
            assessment.progress, report.reason, report.suggestion
        ),
        None => format!("stuck at {}", assessment.progress),
    }
}
