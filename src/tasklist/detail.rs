//! Task detail documents.
//!
//! A task with an explicit id may carry a detail document
//! (`tasks/<ID>.md`) with a status line, a title heading and an
//! `## Acceptance Criteria` checkbox list. Acceptance progress is derived
//! from that list on demand; it is never stored separately.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{tokenize_line, LineKind, TaskStatus};

static STATUS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"##\s*Status[:\s]+([A-Za-z _\-]+)").expect("valid status pattern"));

static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*(?:(?:TASK-\d+|#\d+)[:\s]+)?(.+)$").expect("valid title pattern")
});

/// Parsed task detail document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub id: String,
    pub name: String,
    pub status: String,
    /// Acceptance criteria lines with their checked state, document order
    pub acceptance: Vec<(String, bool)>,
}

impl TaskDetail {
    /// Parse a detail document for `task_id`.
    #[must_use]
    pub fn parse(content: &str, task_id: &str) -> Self {
        let status = STATUS_LINE
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let name = content
            .lines()
            .find(|line| line.trim_start().starts_with('#'))
            .and_then(|line| TITLE_LINE.captures(line.trim_start()))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| task_id.to_string());

        Self {
            id: task_id.to_string(),
            name,
            status,
            acceptance: parse_acceptance(content),
        }
    }

    /// Load and parse the detail document at `path`; `None` when absent.
    #[must_use]
    pub fn load(path: &Path, task_id: &str) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&content, task_id))
    }

    /// Derived acceptance progress as `(completed, total)`; `None` when the
    /// document has no criteria.
    #[must_use]
    pub fn acceptance_progress(&self) -> Option<(usize, usize)> {
        if self.acceptance.is_empty() {
            return None;
        }
        let done = self.acceptance.iter().filter(|(_, c)| *c).count();
        Some((done, self.acceptance.len()))
    }

    /// Acceptance progress rendered as `completed/total`.
    #[must_use]
    pub fn acceptance_progress_string(&self) -> Option<String> {
        self.acceptance_progress().map(|(c, t)| format!("{}/{}", c, t))
    }
}

/// Collect checkbox lines inside the `## Acceptance Criteria` section,
/// stopping at the next `##` heading.
fn parse_acceptance(content: &str) -> Vec<(String, bool)> {
    let mut in_section = false;
    let mut items = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("##") {
            in_section = trimmed
                .trim_start_matches('#')
                .trim()
                .to_lowercase()
                .starts_with("acceptance");
            continue;
        }
        if !in_section {
            continue;
        }
        if let LineKind::Task { status, content } = tokenize_line(line) {
            items.push((content, status == TaskStatus::Completed));
        }
    }

    items
}
