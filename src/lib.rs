//! Loopkeeper - task-loop state and briefing driver
//!
//! Drives a long-running, unattended task-execution loop: tracks which
//! unit of work is current, records failures, detects when the loop is
//! stuck repeating the same failure, and assembles a size-bounded briefing
//! that lets an external executor resume work correctly after its own
//! memory has been reset.
//!
//! # Architecture
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Custom error types and handling
//! - [`tasklist`] - Task list and task detail parsing
//! - [`state`] - Durable progress state and its stores
//! - [`errorlog`] - Bounded failure log
//! - [`stuck`] - Stuck-loop detection
//! - [`controller`] - Phase derivation and continue/stop decisions
//! - [`briefing`] - Budget-truncated briefing assembly
//!
//! # Example
//!
//! ```rust,ignore
//! use loopkeeper::config::LoopConfig;
//! use loopkeeper::controller;
//! use loopkeeper::errorlog::ErrorLog;
//! use loopkeeper::state::ProgressState;
//! use loopkeeper::tasklist::TaskListSource;
//!
//! let config = LoopConfig::load(".".as_ref())?;
//! let source = TaskListSource::load(&config.task_list_path(".".as_ref()));
//! let state = ProgressState::new();
//! let errors = ErrorLog::new(config.error_log_capacity);
//!
//! let assessment = controller::assess(&source, &state, &errors, &config.thresholds);
//! let decision = controller::decide(&assessment);
//! println!("{}", serde_json::to_string(&decision)?);
//! ```

pub mod briefing;
pub mod config;
pub mod controller;
pub mod error;
pub mod errorlog;
pub mod state;
pub mod stuck;
pub mod tasklist;

// Re-export commonly used types
pub use error::{LoopkeeperError, Result};

pub use config::{LoopConfig, MalformedPolicy, StuckThresholds};
pub use controller::{Assessment, LoopDecision, LoopPhase, Verdict};
pub use errorlog::{ErrorLog, ErrorRecord, ResolveOutcome};
pub use state::{CurrentTask, ProgressState};
pub use stuck::{StuckKind, StuckReport};
pub use tasklist::{TaskList, TaskListSource, TaskStatus};
