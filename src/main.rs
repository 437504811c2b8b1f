//! Loopkeeper - task-loop state and briefing driver
//!
//! CLI surface for the loop: synchronize state from the task list, emit
//! continue/stop decisions as JSON, record and resolve failures, and
//! assemble executor briefings.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use loopkeeper::briefing::{self, BriefingContext, BriefingProfile};
use loopkeeper::controller::{self, Assessment};
use loopkeeper::state::store::{JsonFileStore, StateStore};
use loopkeeper::state::{log_decision, NextAction, ProgressState};
use loopkeeper::tasklist::TaskListSource;
use loopkeeper::{ErrorLog, LoopConfig, LoopkeeperError, ResolveOutcome};

#[derive(Parser)]
#[command(name = "loopkeeper")]
#[command(version = "0.1.0")]
#[command(about = "Task-loop state tracking, stuck detection and executor briefings", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize progress state from the task list
    Sync,

    /// Decide whether another loop iteration should run (JSON on stdout)
    Decide,

    /// Gate an executor's request to stop (JSON on stdout)
    GateStop,

    /// Assemble an executor briefing
    Brief {
        /// Briefing profile
        #[arg(value_enum, default_value = "full")]
        profile: BriefingProfile,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a failure against a task
    RecordError {
        /// What went wrong
        error: String,

        /// Task id (defaults to the current task)
        #[arg(short, long)]
        task: Option<String>,

        /// What was tried before it failed
        #[arg(short, long)]
        fix: Option<String>,
    },

    /// Mark the most recent unresolved error on a task as resolved
    ResolveError {
        /// How it was fixed
        resolution: String,

        /// Task id (defaults to the current task)
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Record executor progress (working context, next action, checkpoint)
    RecordProgress {
        /// File currently being worked on
        #[arg(long)]
        file: Option<String>,

        /// Function currently being worked on
        #[arg(long)]
        function: Option<String>,

        /// Next action hint
        #[arg(long)]
        action: Option<String>,

        /// Target of the next action
        #[arg(long)]
        target: Option<String>,

        /// Checkpoint note
        #[arg(long)]
        note: Option<String>,
    },

    /// Show loop status
    Status,
}

// ============================================================================
// Workspace
// ============================================================================

/// A project root with its configuration and persisted records.
struct Workspace {
    root: PathBuf,
    config: LoopConfig,
}

impl Workspace {
    fn open(root: PathBuf) -> anyhow::Result<Self> {
        let config = LoopConfig::load(&root)?;
        Ok(Self { root, config })
    }

    fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.config.state_path(&self.root), self.config.on_malformed)
    }

    fn load_state(&self) -> anyhow::Result<ProgressState> {
        Ok(self.store().load()?)
    }

    fn load_errors(&self) -> anyhow::Result<ErrorLog> {
        Ok(ErrorLog::load(
            &self.config.errors_path(&self.root),
            self.config.error_log_capacity,
            self.config.on_malformed,
        )?)
    }

    fn load_list(&self) -> TaskListSource {
        TaskListSource::load(&self.config.task_list_path(&self.root))
    }

    fn assess(
        &self,
        source: &TaskListSource,
        state: &ProgressState,
        errors: &ErrorLog,
    ) -> Assessment {
        controller::assess(source, state, errors, &self.config.thresholds)
    }

    fn log_decision(&self, message: &str) -> anyhow::Result<()> {
        log_decision(&self.config.decisions_path(&self.root), message)?;
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "loopkeeper=debug,info"
    } else {
        "loopkeeper=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project = cli.project.canonicalize().unwrap_or(cli.project.clone());
    if !project.exists() {
        eprintln!(
            "{} Project directory does not exist: {}",
            "Error:".red().bold(),
            project.display()
        );
        std::process::exit(1);
    }

    if let Err(err) = run(cli.command, project) {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        let code = err
            .downcast_ref::<LoopkeeperError>()
            .map_or(1, LoopkeeperError::exit_code);
        std::process::exit(code);
    }
}

fn run(command: Commands, project: PathBuf) -> anyhow::Result<()> {
    let ws = Workspace::open(project)?;

    match command {
        Commands::Sync => sync(&ws),
        Commands::Decide => decide(&ws),
        Commands::GateStop => gate_stop(&ws),
        Commands::Brief { profile, output } => brief(&ws, profile, output),
        Commands::RecordError { error, task, fix } => record_error(&ws, error, task, fix),
        Commands::ResolveError { resolution, task } => resolve_error(&ws, resolution, task),
        Commands::RecordProgress {
            file,
            function,
            action,
            target,
            note,
        } => record_progress(&ws, file, function, action, target, note),
        Commands::Status => status(&ws),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn sync(ws: &Workspace) -> anyhow::Result<()> {
    let source = ws.load_list();
    let mut state = ws.load_state()?;

    match source.list() {
        Some(list) => {
            state.sync_with_list(list, ws.config.thresholds.max_retries, chrono::Utc::now());
            ws.store().save(&state)?;
            ws.log_decision(&format!(
                "SYNC: progress {} current {}",
                state.progress.fraction(),
                state.current_task.label()
            ))?;
            println!(
                "{} {} | current task: {}",
                "Synced:".green().bold(),
                state.progress.fraction(),
                state.current_task.label()
            );
        }
        None => {
            println!(
                "{} no task list at {}",
                "Skipped:".yellow().bold(),
                ws.config.task_list_path(&ws.root).display()
            );
        }
    }
    Ok(())
}

fn decide(ws: &Workspace) -> anyhow::Result<()> {
    let source = ws.load_list();
    let state = ws.load_state()?;
    let errors = ws.load_errors()?;

    // Read-only: the decision goes to stdout, nothing is persisted.
    let decision = controller::decide(&ws.assess(&source, &state, &errors));
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn gate_stop(ws: &Workspace) -> anyhow::Result<()> {
    let source = ws.load_list();
    let state = ws.load_state()?;
    let errors = ws.load_errors()?;

    let decision = controller::gate_stop(&ws.assess(&source, &state, &errors));
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn brief(ws: &Workspace, profile: BriefingProfile, output: Option<PathBuf>) -> anyhow::Result<()> {
    let source = ws.load_list();
    let state = ws.load_state()?;
    let errors = ws.load_errors()?;
    let assessment = ws.assess(&source, &state, &errors);

    let ctx = BriefingContext {
        project_root: &ws.root,
        config: &ws.config,
        state: &state,
        source: &source,
        errors: &errors,
        assessment: &assessment,
    };
    let document = briefing::assemble(&ctx, profile);

    match output {
        Some(path) => {
            std::fs::write(&path, &document)?;
            println!(
                "{} {} chars -> {}",
                "Briefing:".green().bold(),
                document.chars().count(),
                path.display()
            );
        }
        None => println!("{}", document),
    }
    Ok(())
}

fn record_error(
    ws: &Workspace,
    error: String,
    task: Option<String>,
    fix: Option<String>,
) -> anyhow::Result<()> {
    let mut state = ws.load_state()?;
    let mut errors = ws.load_errors()?;

    let Some(task_id) = task.or_else(|| state.current_task.id.clone()) else {
        return Err(LoopkeeperError::NoActiveTask {
            operation: "record-error".into(),
        }
        .into());
    };

    errors.record(&task_id, &error, fix, chrono::Utc::now());
    errors.save(&ws.config.errors_path(&ws.root))?;

    // A failure on the current task also burns a retry.
    if state.current_task.id.as_deref() == Some(task_id.as_str()) {
        state.record_failure();
        ws.store().save(&state)?;
        println!(
            "{} {} on {} (retries {}/{})",
            "Recorded:".red().bold(),
            error,
            task_id,
            state.current_task.retry_count,
            state.current_task.max_retries
        );
    } else {
        println!("{} {} on {}", "Recorded:".red().bold(), error, task_id);
    }
    Ok(())
}

fn resolve_error(ws: &Workspace, resolution: String, task: Option<String>) -> anyhow::Result<()> {
    let state = ws.load_state()?;
    let mut errors = ws.load_errors()?;

    let Some(task_id) = task.or_else(|| state.current_task.id.clone()) else {
        return Err(LoopkeeperError::NoActiveTask {
            operation: "resolve-error".into(),
        }
        .into());
    };

    match errors.resolve(&task_id, &resolution, chrono::Utc::now()) {
        ResolveOutcome::Resolved => {
            errors.save(&ws.config.errors_path(&ws.root))?;
            println!("{} latest error on {}", "Resolved:".green().bold(), task_id);
        }
        ResolveOutcome::NotFound => {
            println!(
                "{} no unresolved error on {}",
                "Skipped:".yellow().bold(),
                task_id
            );
        }
    }
    Ok(())
}

fn record_progress(
    ws: &Workspace,
    file: Option<String>,
    function: Option<String>,
    action: Option<String>,
    target: Option<String>,
    note: Option<String>,
) -> anyhow::Result<()> {
    let mut state = ws.load_state()?;

    if let Some(file) = file {
        if !state.active_files.contains(&file) {
            state.active_files.push(file.clone());
        }
        state.working_context.current_file = Some(file);
    }
    if function.is_some() {
        state.working_context.current_function = function;
    }
    if let Some(action) = action {
        state.next_action = NextAction {
            action,
            target,
            reason: None,
        };
    }
    if let Some(note) = note {
        state.push_checkpoint(
            "PROGRESS",
            note,
            chrono::Utc::now(),
            ws.config.checkpoint_capacity,
        );
    }

    ws.store().save(&state)?;
    println!("{} state updated", "Recorded:".green().bold());
    Ok(())
}

fn status(ws: &Workspace) -> anyhow::Result<()> {
    let source = ws.load_list();
    let state = ws.load_state()?;
    let errors = ws.load_errors()?;
    let assessment = ws.assess(&source, &state, &errors);

    let phase = match assessment.phase {
        controller::LoopPhase::Active => "ACTIVE".green().bold(),
        controller::LoopPhase::Complete => "COMPLETE".green().bold(),
        controller::LoopPhase::Stuck => "STUCK".red().bold(),
        controller::LoopPhase::Uninitialized => "UNINITIALIZED".yellow().bold(),
    };

    println!("Phase:    {}", phase);
    println!("Progress: {}", assessment.progress);
    println!(
        "Current:  {} ({} retries)",
        state.current_task.label(),
        state.current_task.retry_count
    );
    if let Some(phase) = &state.progress.current_phase {
        println!("Plan:     {}", phase);
    }
    let unresolved = state
        .current_task
        .id
        .as_deref()
        .map_or(0, |id| errors.count_unresolved(id));
    println!(
        "Errors:   {} recorded, {} unresolved on current task",
        errors.len(),
        unresolved
    );
    if let Some(report) = &assessment.stuck {
        println!("{}  {}", "Stuck:".red().bold(), report.reason);
        println!("          {}", report.suggestion);
    }
    Ok(())
}
