//! GitHub API error types

use thiserror::Error;

/// Errors from the GitHub control-plane client
#[derive(Debug, Error)]
pub enum HubError {
    /// Bad or missing credential
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Repository, workflow, run, or release absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Repository creation failed for a reason other than pre-existence
    #[error("Repository name conflict: {0}")]
    NameConflict(String),

    /// Dispatch target workflow not (yet) registered by the CI system
    #[error("Workflow '{0}' is not registered yet")]
    WorkflowNotRegistered(String),

    /// Rate limited by the API
    #[error("Rate limited by the API")]
    RateLimited,

    /// Other API error
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// No release exists in the repository
    #[error("No releases found in repository")]
    NoRelease,

    /// No release asset matched the requested extension
    #[error("No release asset matching '{0}' found")]
    ArtifactNotFound(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Log bundle is not a valid zip archive
    #[error("Invalid log bundle: {0}")]
    InvalidLogBundle(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HubError {
    /// Whether this failure is transient and safe to retry on the next poll
    /// tick (network hiccups, rate limiting, server-side errors). Fatal
    /// classes (auth, not-found, policy) are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            HubError::Http(_) => true,
            HubError::RateLimited => true,
            HubError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HubError::RateLimited.is_transient());
        assert!(HubError::ApiError {
            status: 502,
            message: "bad gateway".to_string()
        }
        .is_transient());

        assert!(!HubError::AuthenticationFailed("bad token".to_string()).is_transient());
        assert!(!HubError::ApiError {
            status: 422,
            message: "unprocessable".to_string()
        }
        .is_transient());
        assert!(!HubError::NotFound("repo".to_string()).is_transient());
    }
}
