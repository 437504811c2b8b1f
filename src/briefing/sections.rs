//! Briefing section producers.
//!
//! One producer per section, all profiles share them. A producer returns
//! `None` when its source is absent and the section should be omitted, or
//! a rendered block otherwise. Free text pulled in from files or external
//! tools is head-tail truncated to the per-section cap before it ever
//! reaches assembly.

use std::time::Duration;

use super::{git, structure, truncate::truncate_middle, BriefingContext, BriefingProfile};
use crate::controller::LoopPhase;
use crate::errorlog::ErrorRecord;
use crate::tasklist::{TaskDetail, TaskItem};

/// The sections of a briefing, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionId {
    Banner,
    StateSummary,
    TaskListSummary,
    CurrentTask,
    Errors,
    Contract,
    ActiveFiles,
    Structure,
    RecentChanges,
    DecisionLog,
}

/// Canonical section order, invariant across profiles.
pub const CANONICAL_ORDER: [SectionId; 10] = [
    SectionId::Banner,
    SectionId::StateSummary,
    SectionId::TaskListSummary,
    SectionId::CurrentTask,
    SectionId::Errors,
    SectionId::Contract,
    SectionId::ActiveFiles,
    SectionId::Structure,
    SectionId::RecentChanges,
    SectionId::DecisionLog,
];

/// Render one section, or `None` to omit it.
#[must_use]
pub fn render(ctx: &BriefingContext<'_>, id: SectionId, profile: BriefingProfile) -> Option<String> {
    match id {
        SectionId::Banner => Some(banner(ctx)),
        SectionId::StateSummary => Some(state_summary(ctx)),
        SectionId::TaskListSummary => Some(task_list_summary(ctx)),
        SectionId::CurrentTask => Some(current_task(ctx)),
        SectionId::Errors => errors(ctx, profile),
        SectionId::Contract => contract(ctx),
        SectionId::ActiveFiles => active_files(ctx, profile),
        SectionId::Structure => structure_digest(ctx),
        SectionId::RecentChanges => recent_changes(ctx),
        SectionId::DecisionLog => decision_log(ctx),
    }
}

fn section(title: &str, body: &str) -> String {
    format!("## {}\n\n{}", title, body.trim_end())
}

// ============================================================================
// Producers
// ============================================================================

fn banner(ctx: &BriefingContext<'_>) -> String {
    format!(
        "# LOOPKEEPER BRIEFING\n\nPhase: {} | Progress: {}\n\nYou are resuming an automated \
         task loop. Read the state below before doing anything else.",
        ctx.assessment.phase, ctx.assessment.progress
    )
}

fn state_summary(ctx: &BriefingContext<'_>) -> String {
    let task = &ctx.state.current_task;
    let mut body = format!(
        "Current task: {} ({})\nRetries: {}/{}\nNext action: {}",
        task.label(),
        if task.status.is_empty() { "-" } else { &task.status },
        task.retry_count,
        task.max_retries,
        ctx.state.next_action.action,
    );
    if let Some(target) = &ctx.state.next_action.target {
        body.push_str(&format!(" -> {}", target));
    }
    if let Some(file) = &ctx.state.working_context.current_file {
        body.push_str(&format!("\nWorking file: {}", file));
    }
    if ctx.assessment.phase == LoopPhase::Stuck {
        if let Some(report) = &ctx.assessment.stuck {
            body.push_str(&format!(
                "\nSTUCK: {}\nSuggestion: {}",
                report.reason, report.suggestion
            ));
        }
    }
    section("State", &body)
}

fn task_line(item: &TaskItem) -> String {
    format!("- {} {} {}", item.status.as_marker(), item.key(), item.name())
}

fn task_list_summary(ctx: &BriefingContext<'_>) -> String {
    let Some(list) = ctx.source.list() else {
        return section("Task list", "(no task list found; the loop is uninitialized)");
    };

    let mut body = format!(
        "{} total: {} pending, {} in progress, {} completed",
        list.total(),
        list.pending.len(),
        list.in_progress.len(),
        list.completed.len()
    );
    if let Some(phase) = &list.current_phase {
        body.push_str(&format!("\nCurrent phase: {}", phase));
    }
    for item in list.in_progress.iter().chain(list.pending.iter()) {
        body.push('\n');
        body.push_str(&task_line(item));
    }
    section("Task list", &body)
}

fn current_task(ctx: &BriefingContext<'_>) -> String {
    let Some(id) = ctx.state.current_task.id.as_deref() else {
        return section("Current task", "(no active task)");
    };

    let path = ctx.config.task_detail_path(ctx.project_root, id);
    let mut body = match TaskDetail::load(&path, id) {
        Some(detail) => {
            let mut text = format!("{}: {}\nStatus: {}", detail.id, detail.name, detail.status);
            if let Some(progress) = detail.acceptance_progress_string() {
                text.push_str(&format!("\nAcceptance criteria: {}", progress));
            }
            for (criterion, done) in &detail.acceptance {
                text.push_str(&format!(
                    "\n- [{}] {}",
                    if *done { 'x' } else { ' ' },
                    criterion
                ));
            }
            text
        }
        None => format!("{} (no detail document)", id),
    };
    if let Some(started) = ctx.state.current_task.started_at {
        body.push_str(&format!("\nStarted: {}", started.to_rfc3339()));
    }
    section("Current task", &truncate_middle(&body, ctx.config.budgets.section))
}

fn error_line(record: &ErrorRecord) -> String {
    let mut line = format!(
        "- [{}] {}: {}",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.task_id,
        record.error
    );
    if let Some(fix) = &record.attempted_fix {
        line.push_str(&format!(" (attempted: {})", fix));
    }
    if let Some(resolution) = &record.resolution {
        line.push_str(&format!(" [resolved: {}]", resolution));
    }
    line
}

fn errors(ctx: &BriefingContext<'_>, profile: BriefingProfile) -> Option<String> {
    let current_only = profile == BriefingProfile::Task;
    let current_id = ctx.state.current_task.id.as_deref();

    let relevant: Vec<&ErrorRecord> = ctx
        .errors
        .iter()
        .filter(|r| !current_only || current_id == Some(r.task_id.as_str()))
        .collect();
    if relevant.is_empty() {
        return None;
    }

    // Unresolved first; within each group newest first, the repeat
    // offenders the executor needs to see are the recent ones.
    let mut body = String::new();
    for record in relevant.iter().rev().filter(|r| r.is_unresolved()) {
        body.push_str(&error_line(record));
        body.push('\n');
    }
    for record in relevant.iter().rev().filter(|r| !r.is_unresolved()) {
        body.push_str(&error_line(record));
        body.push('\n');
    }
    Some(section(
        "Errors",
        &truncate_middle(&body, ctx.config.budgets.section),
    ))
}

fn contract(ctx: &BriefingContext<'_>) -> Option<String> {
    let path = ctx.config.contract_path(ctx.project_root);
    let content = std::fs::read_to_string(&path).ok()?;
    Some(section(
        "Contract",
        &truncate_middle(&content, ctx.config.budgets.section),
    ))
}

fn active_files(ctx: &BriefingContext<'_>, profile: BriefingProfile) -> Option<String> {
    if ctx.state.active_files.is_empty() {
        return None;
    }
    let limit = match profile {
        BriefingProfile::Task => 3,
        _ => usize::MAX,
    };
    let mut body = String::new();
    for file in ctx.state.active_files.iter().take(limit) {
        body.push_str(&format!("### {}\n", file));
        match std::fs::read_to_string(ctx.project_root.join(file)) {
            Ok(content) => {
                body.push_str(&truncate_middle(&content, ctx.config.budgets.section));
                body.push('\n');
            }
            Err(_) => body.push_str("(not readable)\n"),
        }
    }
    Some(section("Active files", &body))
}

fn structure_digest(ctx: &BriefingContext<'_>) -> Option<String> {
    let digest = structure::digest(ctx.project_root)?;
    Some(section(
        "Project structure",
        &truncate_middle(&digest, ctx.config.budgets.section),
    ))
}

fn recent_changes(ctx: &BriefingContext<'_>) -> Option<String> {
    let changes = git::recent_changes(
        ctx.project_root,
        Duration::from_secs(ctx.config.tool_timeout_secs),
    )?;
    Some(section(
        "Recent changes",
        &truncate_middle(&changes, ctx.config.budgets.section),
    ))
}

fn decision_log(ctx: &BriefingContext<'_>) -> Option<String> {
    let path = ctx.config.decisions_path(ctx.project_root);
    let content = std::fs::read_to_string(&path).ok()?;
    if content.trim().is_empty() {
        return None;
    }
    Some(section(
        "Decision log",
        &truncate_middle(&content, ctx.config.budgets.section),
    ))
}
