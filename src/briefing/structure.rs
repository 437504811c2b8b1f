//! Project-structure digest.
//!
//! A shallow, indentation-based listing of the project tree, bounded in
//! depth and entry count so a large repository cannot blow the briefing
//! budget before truncation even runs.

use std::path::Path;
use walkdir::WalkDir;

use crate::config::default_ignore_dirs;

const MAX_DEPTH: usize = 3;
const MAX_ENTRIES: usize = 200;

/// Render the digest, or `None` when the root is unreadable or empty.
#[must_use]
pub fn digest(project_root: &Path) -> Option<String> {
    let ignored = default_ignore_dirs();
    let mut lines = Vec::new();
    let mut truncated = false;

    let walker = WalkDir::new(project_root)
        .min_depth(1)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir() && ignored.contains(&name.as_ref()))
                && !name.starts_with('.')
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if lines.len() >= MAX_ENTRIES {
            truncated = true;
            break;
        }
        let depth = entry.depth();
        let name = entry.file_name().to_string_lossy();
        let suffix = if entry.file_type().is_dir() { "/" } else { "" };
        lines.push(format!("{}{}{}", "  ".repeat(depth - 1), name, suffix));
    }

    if lines.is_empty() {
        return None;
    }
    if truncated {
        lines.push(format!("... ({}+ entries, listing capped)", MAX_ENTRIES));
    }
    Some(lines.join("\n"))
}
