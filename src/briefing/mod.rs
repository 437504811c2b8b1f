//! Briefing assembly.
//!
//! A briefing is the document handed to the executor at the start of an
//! iteration: everything it needs to resume work after its own memory has
//! been reset. Sections come from shared producers in a fixed canonical
//! order; a profile only selects which sections appear and what the total
//! character budget is. Each embedded free-text block is truncated to the
//! per-section cap on the way in, then the assembled whole gets a second
//! head-tail pass against the profile budget.

pub mod git;
pub mod sections;
pub mod structure;
pub mod truncate;

use std::path::Path;

use crate::config::LoopConfig;
use crate::controller::Assessment;
use crate::errorlog::ErrorLog;
use crate::state::ProgressState;
use crate::tasklist::TaskListSource;

use sections::{SectionId, CANONICAL_ORDER};
use truncate::truncate_middle;

/// Which briefing to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BriefingProfile {
    /// Every section, for a fresh or badly lost executor
    Full,
    /// State, tasks, contract and errors, for review passes
    Review,
    /// The minimum needed to continue the current task
    Task,
}

impl BriefingProfile {
    /// Whether this profile includes the given section.
    #[must_use]
    pub fn includes(&self, id: SectionId) -> bool {
        match self {
            Self::Full => true,
            Self::Review => matches!(
                id,
                SectionId::Banner
                    | SectionId::StateSummary
                    | SectionId::TaskListSummary
                    | SectionId::CurrentTask
                    | SectionId::Contract
                    | SectionId::RecentChanges
                    | SectionId::Errors
            ),
            Self::Task => matches!(
                id,
                SectionId::Banner
                    | SectionId::StateSummary
                    | SectionId::CurrentTask
                    | SectionId::Contract
                    | SectionId::Errors
                    | SectionId::ActiveFiles
            ),
        }
    }

    /// Total character budget for this profile.
    #[must_use]
    pub fn budget(&self, config: &LoopConfig) -> usize {
        match self {
            Self::Full => config.budgets.full,
            Self::Review => config.budgets.review,
            Self::Task => config.budgets.task,
        }
    }
}

/// Everything a section producer may draw on.
pub struct BriefingContext<'a> {
    pub project_root: &'a Path,
    pub config: &'a LoopConfig,
    pub state: &'a ProgressState,
    pub source: &'a TaskListSource,
    pub errors: &'a ErrorLog,
    pub assessment: &'a Assessment,
}

/// Assemble a briefing for the given profile.
#[must_use]
pub fn assemble(ctx: &BriefingContext<'_>, profile: BriefingProfile) -> String {
    let blocks: Vec<String> = CANONICAL_ORDER
        .iter()
        .filter(|id| profile.includes(**id))
        .filter_map(|id| sections::render(ctx, *id, profile))
        .collect();

    let document = blocks.join("\n\n");
    truncate_middle(&document, profile.budget(ctx.config))
}
