//! Repository provisioning
//!
//! Creating a repository is the only non-idempotent remote action in the
//! whole pipeline, so `ensure_repo` always re-checks existence before
//! creating and callers must never blind-retry the creation call after a
//! transient failure.

use reqwest::Method;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::client::HubClient;
use crate::error::{HubError, Result};
use crate::types::RepoRef;

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Deserialize)]
struct RepoResponse {
    name: String,
    owner: OwnerResponse,
}

#[derive(Deserialize)]
struct OwnerResponse {
    login: String,
}

impl HubClient {
    /// Login of the authenticated user
    pub async fn authenticated_user(&self) -> Result<String> {
        let user: UserResponse = self.get_json("/user").await?;
        Ok(user.login)
    }

    /// Ensure a repository named `name` exists under the authenticated user.
    ///
    /// Reuses an existing repository; otherwise creates a public one with no
    /// auto-initialized content. Creation failures other than pre-existence
    /// surface as [`HubError::NameConflict`].
    #[instrument(skip(self))]
    pub async fn ensure_repo(&self, name: &str) -> Result<RepoRef> {
        let owner = self.authenticated_user().await?;

        match self
            .get_json::<RepoResponse>(&format!("/repos/{}/{}", owner, name))
            .await
        {
            Ok(repo) => {
                info!(repo = %format!("{}/{}", repo.owner.login, repo.name), "repository exists, reusing");
                return Ok(RepoRef::new(repo.owner.login, repo.name));
            }
            Err(HubError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        info!(name, "creating repository");
        let body = serde_json::json!({
            "name": name,
            "private": false,
            "auto_init": false,
        });

        let response = self.send(Method::POST, "/user/repos", Some(body)).await;
        match response {
            Ok(response) => {
                let repo: RepoResponse = response.json().await?;
                Ok(RepoRef::new(repo.owner.login, repo.name))
            }
            Err(HubError::ApiError { status: 422, message }) => {
                Err(HubError::NameConflict(message))
            }
            Err(e) => Err(e),
        }
    }

    /// Enable Actions with write permissions for the repository.
    ///
    /// Required so the workflow's `GITHUB_TOKEN` may upload release assets.
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn set_actions_permissions(&self, repo: &RepoRef) -> Result<()> {
        let body = serde_json::json!({
            "enabled": true,
            "allowed_actions": "all",
            "permissions": {
                "contents": "write"
            }
        });

        self.send(
            Method::PUT,
            &format!("/repos/{}/actions/permissions", repo.full_name()),
            Some(body),
        )
        .await?;

        info!(repo = %repo, "actions permissions set to read/write");
        Ok(())
    }

    /// Delete all recorded workflow runs in the repository. Best effort:
    /// individual deletion failures are reported but do not stop the sweep.
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn delete_old_runs(&self, repo: &RepoRef) -> Result<usize> {
        let mut deleted = 0;
        for workflow in self.list_workflows(repo).await? {
            for run in self.list_runs(repo, workflow.id, None).await? {
                match self
                    .send(
                        Method::DELETE,
                        &format!("/repos/{}/actions/runs/{}", repo.full_name(), run.id),
                        None,
                    )
                    .await
                {
                    Ok(_) => deleted += 1,
                    Err(e) => {
                        tracing::warn!(run_id = run.id, error = %e, "failed to delete workflow run")
                    }
                }
            }
        }
        info!(deleted, "deleted old workflow runs");
        Ok(deleted)
    }
}
