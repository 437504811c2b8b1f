//! Custom error types for loopkeeper.
//!
//! The loop is designed to always produce a decision, so most failure
//! conditions stay internal: absent inputs and collaborator failures are
//! downgraded to "section omitted" or "uninitialized" long before they
//! could abort an invocation. What remains here are the conditions an
//! operator actually needs to see.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for loopkeeper operations
#[derive(Error, Debug)]
pub enum LoopkeeperError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // State Errors
    // =========================================================================
    /// Persisted record could not be parsed and the policy is to surface it
    #[error("Corrupt state record at {path}: {message}")]
    CorruptState { path: PathBuf, message: String },

    /// State persistence failed
    #[error("State store error: {message}")]
    Store { message: String },

    /// No current task for an operation that requires one
    #[error("No active task: {operation}")]
    NoActiveTask { operation: String },

    // =========================================================================
    // Briefing Errors
    // =========================================================================
    /// Briefing assembly failed
    #[error("Briefing error: {message}")]
    Briefing { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoopkeeperError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a state store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a briefing error
    pub fn briefing(message: impl Into<String>) -> Self {
        Self::Briefing {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (the loop can keep going)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Briefing { .. } | Self::NoActiveTask { .. } | Self::Store { .. }
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            Self::CorruptState { .. } => 3,
            _ => 1,
        }
    }
}

/// Type alias for loopkeeper results
pub type Result<T> = std::result::Result<T, LoopkeeperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoopkeeperError::CorruptState {
            path: PathBuf::from(".loopkeeper/state.json"),
            message: "expected value at line 1".into(),
        };
        assert!(err.to_string().contains("state.json"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(LoopkeeperError::briefing("git timed out").is_recoverable());
        assert!(!LoopkeeperError::config("bad toml").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(LoopkeeperError::config("test").exit_code(), 7);
        assert_eq!(
            LoopkeeperError::CorruptState {
                path: PathBuf::from("x"),
                message: "y".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(LoopkeeperError::store("test").exit_code(), 1);
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/test/config.toml");
        let err = LoopkeeperError::config_with_path("failed to parse", path.clone());
        if let LoopkeeperError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: LoopkeeperError = io_err.into();
        assert!(matches!(err, LoopkeeperError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
