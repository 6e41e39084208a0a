//! Source publishing to remote repository targets
//!
//! Pushes the local project tree to one or more remotes with idempotent
//! commit semantics. Pushes go through the git CLI rather than libgit2 so
//! that the user's existing credential configuration applies.

use std::path::PathBuf;
use std::process::Command;

use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use airlift_core::error::GitError;

use crate::repository::{GitRepo, Result};

/// Output markers that identify a push rejected by remote policy rather than
/// a transient failure. These must never be retried automatically.
const POLICY_REJECTION_MARKERS: &[&str] = &[
    "GH013",
    "push declined due to repository rule violations",
    "secret scanning",
    "protected branch hook declined",
];

/// One destination endpoint for a publish operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Push URL of the remote repository
    pub push_url: String,
    /// Local remote alias, derived deterministically from the URL
    pub alias: String,
}

impl RemoteTarget {
    /// Derive a target from a push URL.
    ///
    /// The alias is `origin_` plus the first six hex characters of the
    /// SHA-256 of the URL: the same URL always maps to the same alias across
    /// invocations, and distinct simultaneous targets cannot collide.
    pub fn from_url(push_url: impl Into<String>) -> Self {
        let push_url = push_url.into();
        let digest = Sha256::digest(push_url.as_bytes());
        let alias = format!("origin_{:02x}{:02x}{:02x}", digest[0], digest[1], digest[2]);
        Self { push_url, alias }
    }

    /// Target for a repository hosted on GitHub under `owner/name`
    pub fn github(owner: &str, name: &str) -> Self {
        Self::from_url(format!("https://github.com/{}/{}.git", owner, name))
    }
}

/// Outcome of the commit step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was created
    Created(String),
    /// The tree already matched HEAD; nothing to commit
    NoChanges,
}

/// A publish request
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Local project directory
    pub project_path: PathBuf,
    /// Remote targets to push to
    pub targets: Vec<RemoteTarget>,
    /// Branch to publish
    pub branch: String,
    /// Commit message
    pub message: String,
    /// Pathspecs to stage; empty stages the full tree
    pub include: Vec<String>,
    /// Pathspecs to unstage after staging (files stay on disk)
    pub exclude: Vec<String>,
}

/// Result of a successful publish
#[derive(Debug, Clone)]
pub struct PublishResult {
    /// What the commit step did
    pub commit: CommitOutcome,
    /// Aliases of the remotes that accepted the push
    pub pushed: Vec<String>,
}

/// Publish the project tree to every target.
///
/// Idempotent end to end: re-running with an unchanged tree produces a
/// no-op commit outcome and force-pushes the same tip everywhere, so all
/// targets hold identical branch content afterwards.
#[instrument(skip(request), fields(path = %request.project_path.display(), branch = %request.branch))]
pub fn publish(request: &PublishRequest) -> Result<PublishResult> {
    let repo = GitRepo::open_or_init(&request.project_path)?;

    for target in &request.targets {
        repo.ensure_remote(&target.alias, &target.push_url)?;
    }

    repo.stage(&request.include, &request.exclude)?;

    let commit = match repo.commit(&request.message)? {
        Some(id) => CommitOutcome::Created(id),
        None => CommitOutcome::NoChanges,
    };

    repo.set_branch(&request.branch)?;

    let mut pushed = Vec::with_capacity(request.targets.len());
    for target in &request.targets {
        force_push(&repo, &target.alias, &request.branch)?;
        pushed.push(target.alias.clone());
    }

    Ok(PublishResult { commit, pushed })
}

/// Force-push `branch` to the remote `alias` using the git CLI.
#[instrument(skip(repo))]
pub fn force_push(repo: &GitRepo, alias: &str, branch: &str) -> Result<()> {
    let start = std::time::Instant::now();
    let output = Command::new("git")
        .current_dir(repo.path())
        .args(["push", "-u", alias, branch, "-f"])
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::GitNotFound
            } else {
                GitError::Io(e)
            }
        })?;

    info!(
        remote = alias,
        branch,
        duration_ms = start.elapsed().as_millis(),
        success = output.status.success(),
        "git push (CLI)"
    );

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let combined = format!("{}{}", stdout, stderr);

    if POLICY_REJECTION_MARKERS
        .iter()
        .any(|marker| combined.contains(marker))
    {
        warn!(remote = alias, "push rejected by repository rules");
        return Err(GitError::PolicyRejection {
            remote: alias.to_string(),
            reason: first_meaningful_line(&combined),
        });
    }

    Err(GitError::PushFailed {
        remote: alias.to_string(),
        reason: first_meaningful_line(&combined),
    })
}

fn first_meaningful_line(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output from git")
        .to_string()
}
