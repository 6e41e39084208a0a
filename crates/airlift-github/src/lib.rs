//! Airlift GitHub - control-plane client for the remote build pipeline
//!
//! Wraps the GitHub REST API behind a closed error taxonomy: repository
//! provisioning, workflow dispatch, run monitoring, release artifact
//! download, and run log collection.

mod actions;
mod client;
mod error;
mod logs;
mod monitor;
mod releases;
mod repos;
mod types;

pub use actions::ActionsApi;
pub use client::HubClient;
pub use error::{HubError, Result};
pub use logs::LogEntry;
pub use monitor::{monitor_run, MonitorState, PollBudget, RunOutcome};
pub use types::{Release, ReleaseAsset, RepoRef, RunConclusion, RunStatus, Workflow, WorkflowRun};
