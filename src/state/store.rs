//! Progress-state persistence.
//!
//! The aggregate is persisted as one JSON record and replaced wholesale on
//! every save (read-modify-write of the full aggregate). If two invocations
//! interleave, the last writer wins; loopkeeper assumes a single process
//! and does not lock.
//!
//! The [`StateStore`] trait exists so the controller can be driven against
//! an in-memory store in tests.

use std::cell::RefCell;
use std::path::PathBuf;

use crate::config::MalformedPolicy;
use crate::error::{LoopkeeperError, Result};
use crate::state::ProgressState;

/// Storage for the single progress-state record.
pub trait StateStore {
    /// Load the record, returning the empty state when none exists.
    fn load(&self) -> Result<ProgressState>;

    /// Replace the record.
    fn save(&self, state: &ProgressState) -> Result<()>;
}

// ============================================================================
// JSON file store
// ============================================================================

/// File-backed store writing one pretty-printed JSON record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    policy: MalformedPolicy,
}

impl JsonFileStore {
    /// Create a store at `path` with the given malformed-record policy.
    #[must_use]
    pub fn new(path: PathBuf, policy: MalformedPolicy) -> Self {
        Self { path, policy }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<ProgressState> {
        if !self.path.exists() {
            return Ok(ProgressState::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(e) => match self.policy {
                MalformedPolicy::UseDefault => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "state record malformed, continuing from defaults"
                    );
                    Ok(ProgressState::new())
                }
                MalformedPolicy::Surface => Err(LoopkeeperError::CorruptState {
                    path: self.path.clone(),
                    message: e.to_string(),
                }),
            },
        }
    }

    fn save(&self, state: &ProgressState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Whole-record overwrite via a temp file so a crash mid-write never
        // leaves a half-record behind.
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory store for unit tests and dry runs. Single-threaded, like the
/// loop itself.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RefCell<Option<ProgressState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a state.
    #[must_use]
    pub fn with_state(state: ProgressState) -> Self {
        Self {
            inner: RefCell::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<ProgressState> {
        Ok(self.inner.borrow().clone().unwrap_or_default())
    }

    fn save(&self, state: &ProgressState) -> Result<()> {
        *self.inner.borrow_mut() = Some(state.clone());
        Ok(())
    }
}
