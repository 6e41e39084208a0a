//! Error types for Airlift

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AirliftError
pub type Result<T> = std::result::Result<T, AirliftError>;

/// Main error type for Airlift operations
#[derive(Debug, Error)]
pub enum AirliftError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository and init failed
    #[error("Failed to initialize repository at {path}: {reason}")]
    InitFailed { path: PathBuf, reason: String },

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Failed to stage files
    #[error("Failed to stage files: {0}")]
    StageFailed(String),

    /// Failed to create commit
    #[error("Failed to create commit: {0}")]
    CommitFailed(String),

    /// Failed to move branch
    #[error("Failed to set branch '{branch}': {reason}")]
    BranchFailed { branch: String, reason: String },

    /// Push rejected by remote content or branch rules.
    ///
    /// Fatal and user-actionable: the remote refused the content (secret
    /// scanning, rule violations). Must never be retried automatically.
    #[error("Push to '{remote}' rejected by repository rules: {reason}")]
    PolicyRejection { remote: String, reason: String },

    /// Failed to push
    #[error("Failed to push to remote '{remote}': {reason}")]
    PushFailed { remote: String, reason: String },

    /// Git CLI binary not available
    #[error("git executable not found on PATH")]
    GitNotFound,

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AirliftError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
