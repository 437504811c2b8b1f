//! Task list parsing.
//!
//! The task list is a line-oriented markdown document. Each line whose
//! prefix (after optional indentation) is a recognized checkbox marker
//! becomes a task in that category, in document order:
//!
//! ```text
//! - [ ] TASK-001: Pending work
//! - [>] TASK-002: In progress          (also accepted: - [~])
//! - [x] TASK-003: Done                 (also accepted: - [X])
//! ```
//!
//! Lines without a marker are ignored, not errors. Marker detection is a
//! small explicit tokenizer returning a tagged [`LineKind`] rather than
//! substring matching, so a line can never fall into two categories.
//!
//! "Next actionable" models "finish what's started before starting new
//! work": the first in-progress task in document order, otherwise the
//! first pending task.

pub mod detail;

pub use detail::TaskDetail;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::LazyLock;

static TASK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(TASK-\d+|#\d+)").expect("valid task id pattern"));

static CURRENT_PHASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##\s*Current[:\s]+(Phase\s+\d+|[A-Za-z0-9][A-Za-z0-9 .\-]*)")
        .expect("valid phase pattern")
});

// ============================================================================
// Status markers
// ============================================================================

/// Status of a task line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// `- [ ]`
    Pending,
    /// `- [>]` or `- [~]`
    InProgress,
    /// `- [x]` or `- [X]`
    Completed,
}

impl TaskStatus {
    /// Map a single marker character to a status.
    #[must_use]
    pub fn from_marker_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Self::Pending),
            '>' | '~' => Some(Self::InProgress),
            'x' | 'X' => Some(Self::Completed),
            _ => None,
        }
    }

    /// Canonical marker rendering for this status.
    #[must_use]
    pub fn as_marker(&self) -> &'static str {
        match self {
            Self::Pending => "[ ]",
            Self::InProgress => "[>]",
            Self::Completed => "[x]",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Tokenizer verdict for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// A recognized task line with its status and trailing free text
    Task { status: TaskStatus, content: String },
    /// Anything else: headings, prose, unknown markers like `- [!]`
    Unrecognized,
}

/// Tokenize one line of the task list.
///
/// The accepted grammar, after leading whitespace, is exactly
/// `- [<marker>] <free text>` where `<marker>` is a single recognized
/// character. Everything else is `Unrecognized`.
#[must_use]
pub fn tokenize_line(line: &str) -> LineKind {
    let trimmed = line.trim_start();
    let Some(rest) = trimmed.strip_prefix("- [") else {
        return LineKind::Unrecognized;
    };

    let mut chars = rest.chars();
    let (Some(marker), Some(']')) = (chars.next(), chars.next()) else {
        return LineKind::Unrecognized;
    };

    match TaskStatus::from_marker_char(marker) {
        Some(status) => LineKind::Task {
            status,
            content: chars.as_str().trim().to_string(),
        },
        None => LineKind::Unrecognized,
    }
}

// ============================================================================
// Task items
// ============================================================================

/// One recognized task line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    /// Explicit id (`TASK-042`, `#17`) when the line carries one
    pub id: Option<String>,
    /// Full original line
    pub raw: String,
    /// Free text after the marker
    pub content: String,
    /// Parsed status
    pub status: TaskStatus,
    /// Ordinal among recognized task lines (document order, 1-based)
    pub ordinal: usize,
}

impl TaskItem {
    /// Stable key for this task: the explicit id when present, otherwise
    /// positional identity rendered `@N`.
    #[must_use]
    pub fn key(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("@{}", self.ordinal))
    }

    /// Short display name, truncated to 100 chars like the state record
    /// expects.
    #[must_use]
    pub fn name(&self) -> String {
        self.content.chars().take(100).collect()
    }
}

// ============================================================================
// Task list
// ============================================================================

/// Parsed task list: three ordered sequences plus derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    pub pending: Vec<TaskItem>,
    pub in_progress: Vec<TaskItem>,
    pub completed: Vec<TaskItem>,
    /// Current phase from a `## Current: ...` line, if any
    pub current_phase: Option<String>,
    /// Hash over the recognized task lines; identifies a list generation
    pub list_hash: String,
}

impl TaskList {
    /// Parse a task list document.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut pending = Vec::new();
        let mut in_progress = Vec::new();
        let mut completed = Vec::new();
        let mut hasher = Sha256::new();
        let mut ordinal = 0usize;

        for line in content.lines() {
            let LineKind::Task { status, content } = tokenize_line(line) else {
                continue;
            };
            ordinal += 1;
            hasher.update(line.trim().as_bytes());
            hasher.update(b"\n");

            let id = TASK_ID
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());

            let item = TaskItem {
                id,
                raw: line.to_string(),
                content,
                status,
                ordinal,
            };

            match status {
                TaskStatus::Pending => pending.push(item),
                TaskStatus::InProgress => in_progress.push(item),
                TaskStatus::Completed => completed.push(item),
            }
        }

        let current_phase = CURRENT_PHASE
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());

        Self {
            pending,
            in_progress,
            completed,
            current_phase,
            list_hash: hex::encode(hasher.finalize()),
        }
    }

    /// Total number of recognized tasks.
    #[must_use]
    pub fn total(&self) -> usize {
        self.pending.len() + self.in_progress.len() + self.completed.len()
    }

    /// The next actionable task: first in-progress in document order,
    /// otherwise first pending. `None` when the list is complete or empty.
    #[must_use]
    pub fn next_task(&self) -> Option<&TaskItem> {
        self.in_progress.first().or_else(|| self.pending.first())
    }

    /// True when the list has tasks and all of them are completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total() > 0 && self.pending.is_empty() && self.in_progress.is_empty()
    }

    /// True when no task line was recognized at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A task list document observed on disk.
///
/// "List absent" and "list present but empty" drive opposite loop
/// decisions, so the distinction is kept explicit here rather than folded
/// into an empty `TaskList`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListSource {
    /// No document at the configured path
    Absent,
    /// Document found and parsed (possibly with zero tasks)
    Present(TaskList),
}

impl TaskListSource {
    /// Read and parse the task list at `path`.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::Present(TaskList::parse(&content)),
            Err(_) => Self::Absent,
        }
    }

    /// The parsed list, when present.
    #[must_use]
    pub fn list(&self) -> Option<&TaskList> {
        match self {
            Self::Present(list) => Some(list),
            Self::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_markers() {
        assert!(matches!(
            tokenize_line("- [ ] A"),
            LineKind::Task {
                status: TaskStatus::Pending,
                ..
            }
        ));
        assert!(matches!(
            tokenize_line("  - [>] B"),
            LineKind::Task {
                status: TaskStatus::InProgress,
                ..
            }
        ));
        assert!(matches!(
            tokenize_line("- [~] B2"),
            LineKind::Task {
                status: TaskStatus::InProgress,
                ..
            }
        ));
        assert!(matches!(
            tokenize_line("- [x] C"),
            LineKind::Task {
                status: TaskStatus::Completed,
                ..
            }
        ));
        assert!(matches!(
            tokenize_line("- [X] C2"),
            LineKind::Task {
                status: TaskStatus::Completed,
                ..
            }
        ));
    }

    #[test]
    fn test_tokenize_unrecognized() {
        assert_eq!(tokenize_line("# Heading"), LineKind::Unrecognized);
        assert_eq!(tokenize_line("- plain bullet"), LineKind::Unrecognized);
        assert_eq!(tokenize_line("- [!] blocked marker"), LineKind::Unrecognized);
        assert_eq!(tokenize_line("- [xx] double"), LineKind::Unrecognized);
        assert_eq!(tokenize_line(""), LineKind::Unrecognized);
    }

    #[test]
    fn test_parse_counts_and_order() {
        let list = TaskList::parse("- [ ] A\n- [>] B\n- [x] C\n");
        assert_eq!(list.pending.len(), 1);
        assert_eq!(list.in_progress.len(), 1);
        assert_eq!(list.completed.len(), 1);
        assert_eq!(list.total(), 3);
        assert_eq!(list.pending[0].content, "A");
        assert_eq!(list.next_task().unwrap().content, "B");
    }

    #[test]
    fn test_total_invariant() {
        let list = TaskList::parse(
            "# Plan\n\n- [ ] one\nprose in between\n- [~] two\n- [X] three\n- [ ] four\n",
        );
        assert_eq!(
            list.total(),
            list.pending.len() + list.in_progress.len() + list.completed.len()
        );
        assert_eq!(list.total(), 4);
    }

    #[test]
    fn test_total_is_monotonic_when_lines_are_kept() {
        // Status edits and appended lines never shrink the total.
        let before = TaskList::parse("- [ ] TASK-001: one\n- [>] TASK-002: two\n");

        let edited = TaskList::parse("- [x] TASK-001: one\n- [>] TASK-002: two\n");
        assert_eq!(edited.total(), before.total());

        let appended =
            TaskList::parse("- [x] TASK-001: one\n- [>] TASK-002: two\n- [ ] TASK-003: three\n");
        assert!(appended.total() >= before.total());
        assert_eq!(appended.total(), 3);
    }

    #[test]
    fn test_next_task_prefers_in_progress_document_order() {
        // in-progress = [T2, T5], pending = [T1, T3] => next is T2
        let list = TaskList::parse(
            "- [ ] TASK-001: one\n- [>] TASK-002: two\n- [ ] TASK-003: three\n- [>] TASK-005: five\n",
        );
        assert_eq!(list.next_task().unwrap().id.as_deref(), Some("TASK-002"));
    }

    #[test]
    fn test_next_task_falls_back_to_first_pending() {
        let list = TaskList::parse("- [x] TASK-001: done\n- [ ] TASK-002: next\n- [ ] TASK-003\n");
        assert_eq!(list.next_task().unwrap().id.as_deref(), Some("TASK-002"));
    }

    #[test]
    fn test_explicit_and_positional_ids() {
        let list = TaskList::parse("- [ ] TASK-010: explicit\n- [ ] no id here\n- [ ] #42 hash id\n");
        assert_eq!(list.pending[0].key(), "TASK-010");
        assert_eq!(list.pending[1].key(), "@2");
        assert_eq!(list.pending[2].key(), "#42");
    }

    #[test]
    fn test_empty_vs_complete() {
        let empty = TaskList::parse("# Nothing here\n");
        assert!(empty.is_empty());
        assert!(!empty.is_complete());

        let done = TaskList::parse("- [x] A\n- [X] B\n");
        assert!(done.is_complete());
        assert!(!done.is_empty());
    }

    #[test]
    fn test_current_phase() {
        let list = TaskList::parse("## Current: Phase 2\n\n- [ ] A\n");
        assert_eq!(list.current_phase.as_deref(), Some("Phase 2"));
    }

    #[test]
    fn test_list_hash_tracks_task_lines_only() {
        let a = TaskList::parse("# Title\n- [ ] A\n");
        let b = TaskList::parse("# Different title\n- [ ] A\n");
        let c = TaskList::parse("# Title\n- [ ] B\n");
        assert_eq!(a.list_hash, b.list_hash);
        assert_ne!(a.list_hash, c.list_hash);
    }

    #[test]
    fn test_source_absent_vs_present() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("TASKS.md");
        assert_eq!(TaskListSource::load(&path), TaskListSource::Absent);

        std::fs::write(&path, "").unwrap();
        let source = TaskListSource::load(&path);
        assert!(matches!(source, TaskListSource::Present(ref l) if l.is_empty()));
    }
}
