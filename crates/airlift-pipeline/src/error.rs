//! Pipeline error types

use thiserror::Error;

use airlift_core::{AirliftError, ConfigError, GitError};
use airlift_github::HubError;

/// Errors from running the build pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local git error
    #[error(transparent)]
    Git(#[from] GitError),

    /// GitHub API error
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Core error (workflow installation, IO)
    #[error(transparent)]
    Core(#[from] AirliftError),

    /// A polling budget expired before the remote state settled
    #[error("Timed out after {elapsed_secs}s ({last_state})")]
    Timeout {
        /// Seconds spent waiting
        elapsed_secs: u64,
        /// Phase the pipeline was waiting in
        last_state: String,
    },

    /// The remote build run concluded with a failure
    #[error("Remote build failed: run {run_id} concluded '{conclusion}'")]
    BuildFailed {
        /// Failed run id
        run_id: u64,
        /// Reported conclusion
        conclusion: String,
    },

    /// The remote build run was cancelled on the CI side
    #[error("Remote build was cancelled: run {run_id}")]
    BuildCancelled {
        /// Cancelled run id
        run_id: u64,
    },

    /// Cancellation was requested locally
    #[error("Cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Whether this error is a local cancellation rather than a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
