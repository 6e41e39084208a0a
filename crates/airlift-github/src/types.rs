//! GitHub API types
//!
//! Run state is observed only: all transitions happen server-side and are
//! discovered by polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a remote repository; key for all API calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owner login
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Create a reference from owner and name
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name` form used in API paths
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A registered workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow id
    pub id: u64,
    /// Display name from the definition
    pub name: String,
    /// Path of the definition file within the repository
    pub path: String,
    /// Registration state reported by the API
    #[serde(default)]
    pub state: String,
}

impl Workflow {
    /// Whether this workflow was defined by the given file name
    pub fn matches_file(&self, file_name: &str) -> bool {
        self.path.rsplit('/').next() == Some(file_name)
    }
}

/// Lifecycle status of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting for a runner
    Queued,
    /// Executing
    InProgress,
    /// Reached a terminal conclusion
    Completed,
    /// Any other server-side status (waiting, requested, pending, ...)
    #[serde(other)]
    Other,
}

/// Terminal outcome classification of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    /// Run succeeded
    Success,
    /// Run failed
    Failure,
    /// Run was cancelled
    Cancelled,
    /// Run hit the CI system's own time limit
    TimedOut,
    /// Any other conclusion (skipped, neutral, stale, ...)
    #[serde(other)]
    Other,
}

impl std::fmt::Display for RunConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunConclusion::Success => write!(f, "success"),
            RunConclusion::Failure => write!(f, "failure"),
            RunConclusion::Cancelled => write!(f, "cancelled"),
            RunConclusion::TimedOut => write!(f, "timed_out"),
            RunConclusion::Other => write!(f, "other"),
        }
    }
}

/// One execution instance of a dispatched workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Run id (identity)
    pub id: u64,
    /// Lifecycle status
    pub status: RunStatus,
    /// Terminal conclusion, present once completed
    pub conclusion: Option<RunConclusion>,
    /// Branch the run executed on
    pub head_branch: String,
    /// Event that triggered the run
    pub event: String,
    /// Server-side creation time
    pub created_at: DateTime<Utc>,
}

/// A published release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Release id
    pub id: u64,
    /// Tag the release was cut from
    pub tag_name: String,
    /// Assets attached to the release, in API listing order
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable asset of a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name
    pub name: String,
    /// Direct download URL
    pub browser_download_url: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}
