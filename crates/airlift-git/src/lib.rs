//! Airlift Git - Local git operations for source publishing
//!
//! This crate wraps the local repository side of publishing: init, remote
//! registration, staging with include/exclude pathspecs, idempotent commits,
//! branch placement, and force-pushes (via the git CLI, which handles
//! credentials the way the user's environment is already configured).

mod publisher;
mod repository;

pub use publisher::{publish, CommitOutcome, PublishRequest, PublishResult, RemoteTarget};
pub use repository::{GitRepo, Result};
