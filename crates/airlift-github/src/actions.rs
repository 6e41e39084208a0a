//! Workflow listing and dispatch

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::client::HubClient;
use crate::error::{HubError, Result};
use crate::types::{RepoRef, Workflow, WorkflowRun};

#[derive(Deserialize)]
struct WorkflowList {
    workflows: Vec<Workflow>,
}

#[derive(Deserialize)]
struct RunList {
    workflow_runs: Vec<WorkflowRun>,
}

/// The read side of the Actions API that the run monitor polls through.
/// Split into a trait so the monitor's state machine can be driven by a
/// scripted fake in tests.
#[async_trait]
pub trait ActionsApi: Send + Sync {
    /// List workflows registered in the repository
    async fn list_workflows(&self, repo: &RepoRef) -> Result<Vec<Workflow>>;

    /// List manually dispatched runs of a workflow on a branch, newest first
    async fn list_dispatch_runs(
        &self,
        repo: &RepoRef,
        workflow_id: u64,
        branch: &str,
    ) -> Result<Vec<WorkflowRun>>;
}

impl HubClient {
    /// List all workflows registered in the repository
    pub async fn list_workflows(&self, repo: &RepoRef) -> Result<Vec<Workflow>> {
        let list: WorkflowList = self
            .get_json(&format!("/repos/{}/actions/workflows", repo.full_name()))
            .await?;
        Ok(list.workflows)
    }

    /// List runs of a workflow, optionally narrowed to one branch
    pub async fn list_runs(
        &self,
        repo: &RepoRef,
        workflow_id: u64,
        branch: Option<&str>,
    ) -> Result<Vec<WorkflowRun>> {
        let mut endpoint = format!(
            "/repos/{}/actions/workflows/{}/runs?per_page=100",
            repo.full_name(),
            workflow_id
        );
        if let Some(branch) = branch {
            endpoint.push_str(&format!("&branch={}", branch));
        }
        let list: RunList = self.get_json(&endpoint).await?;
        Ok(list.workflow_runs)
    }

    /// Trigger a `workflow_dispatch` run of a workflow file on a branch.
    ///
    /// Returns the timestamp captured immediately before the request; runs
    /// created at or after it are candidates for the one just triggered.
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn dispatch(
        &self,
        repo: &RepoRef,
        workflow_file: &str,
        branch: &str,
    ) -> Result<DateTime<Utc>> {
        let dispatched_at = Utc::now();
        let body = serde_json::json!({ "ref": branch });

        let result = self
            .send(
                Method::POST,
                &format!(
                    "/repos/{}/actions/workflows/{}/dispatches",
                    repo.full_name(),
                    workflow_file
                ),
                Some(body),
            )
            .await;

        match result {
            Ok(_) => {
                info!(workflow_file, branch, "workflow dispatched");
                Ok(dispatched_at)
            }
            Err(HubError::NotFound(_)) => {
                Err(HubError::WorkflowNotRegistered(workflow_file.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ActionsApi for HubClient {
    async fn list_workflows(&self, repo: &RepoRef) -> Result<Vec<Workflow>> {
        HubClient::list_workflows(self, repo).await
    }

    async fn list_dispatch_runs(
        &self,
        repo: &RepoRef,
        workflow_id: u64,
        branch: &str,
    ) -> Result<Vec<WorkflowRun>> {
        let runs = self.list_runs(repo, workflow_id, Some(branch)).await?;
        Ok(runs
            .into_iter()
            .filter(|run| run.event == "workflow_dispatch")
            .collect())
    }
}
