//! Recent-change history via the `git` binary.
//!
//! Treated strictly as an optional collaborator: no git binary, no
//! repository, a failing command or a command that outlives its timeout
//! all collapse to `None`, and the briefing simply drops the section.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Recent commits plus a working-tree diffstat, or `None` when git is
/// unavailable in any way.
#[must_use]
pub fn recent_changes(project_root: &Path, timeout: Duration) -> Option<String> {
    which::which("git").ok()?;

    let log = run_git(project_root, &["log", "--oneline", "-10"], timeout)?;

    let mut out = String::from("Recent commits:\n");
    out.push_str(&log);

    // The diffstat is best-effort on top of the log; a clean tree or a
    // diff failure just leaves it out.
    if let Some(diff) = run_git(project_root, &["diff", "--stat", "HEAD"], timeout) {
        if !diff.trim().is_empty() {
            out.push_str("\nUncommitted changes:\n");
            out.push_str(&diff);
        }
    }

    Some(out)
}

/// Run one git command with a wall-clock deadline. Returns stdout on
/// success, `None` on spawn failure, non-zero exit, or timeout (the child
/// is killed on expiry).
fn run_git(project_root: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(project_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if Instant::now() >= deadline {
                    tracing::warn!(args = ?args, timeout = ?timeout, "git timed out, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(e) => {
                tracing::warn!(args = ?args, error = %e, "failed to poll git");
                let _ = child.kill();
                return None;
            }
        }
    }

    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_non_repository_is_none() {
        // `git log` fails outside a repository regardless of the binary
        // being installed, so this covers both absence cases.
        let temp = TempDir::new().unwrap();
        assert_eq!(recent_changes(temp.path(), Duration::from_secs(3)), None);
    }
}
