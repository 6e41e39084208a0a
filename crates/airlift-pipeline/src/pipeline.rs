//! The build pipeline
//!
//! Runs the stages in a fixed order: provision the remote repository,
//! publish the source tree, install and register the CI workflow, dispatch
//! a run, track it to a terminal state, then download the artifacts.
//! Cancellation is cooperative and checked at every stage boundary; remote
//! side effects already performed are never rolled back.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use airlift_core::{
    install_workflow, CancelFlag, EventSink, FlutterWorkflowTemplate, PipelineEvent, Platform,
    Stage, WORKFLOW_FILE_NAME,
};
use airlift_git::{publish, CommitOutcome, PublishRequest, RemoteTarget};
use airlift_github::{monitor_run, HubClient, PollBudget, RepoRef, RunOutcome, WorkflowRun};

use crate::error::{PipelineError, Result};
use crate::options::PipelineOptions;

/// Result of a completed pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    /// The provisioned repository
    pub repo: RepoRef,
    /// The tracked workflow run; absent when the build was skipped
    pub run: Option<WorkflowRun>,
    /// Downloaded artifact path per platform, in configuration order
    pub artifacts: Vec<(Platform, PathBuf)>,
}

/// Orchestrates one remote build from source publish to artifact download
pub struct BuildPipeline<'a> {
    client: &'a HubClient,
    events: &'a dyn EventSink,
    cancel: &'a CancelFlag,
}

impl<'a> BuildPipeline<'a> {
    /// Create a pipeline bound to a client, an event sink, and a
    /// cancellation flag
    pub fn new(client: &'a HubClient, events: &'a dyn EventSink, cancel: &'a CancelFlag) -> Self {
        Self {
            client,
            events,
            cancel,
        }
    }

    /// Run the full pipeline. The skip switches collapse it: with
    /// `skip_publish` the remote tree is used as-is, with `skip_build`
    /// nothing is dispatched and nothing downloaded (the `fetch` command
    /// covers download-only).
    #[instrument(skip_all, fields(repo_name = %options.repo_name, branch = %options.branch))]
    pub async fn run(&self, options: &PipelineOptions) -> Result<PipelineReport> {
        let repo = self.publish_phase(options).await?;

        let (run, artifacts) = if options.skip_build {
            (None, Vec::new())
        } else {
            let dispatched_at = self.dispatch(options, &repo).await?;
            let run = self.monitor(options, &repo, dispatched_at).await?;
            let artifacts = self.fetch_artifacts(options, &repo).await?;
            (Some(run), artifacts)
        };

        if options.verbose_logs {
            if let Some(run) = &run {
                self.collect_logs_best_effort(&repo, run.id).await;
            }
        }

        Ok(PipelineReport {
            repo,
            run,
            artifacts,
        })
    }

    /// Provision the repository and bring its branch up to date, including
    /// the registered workflow. This is the whole of the `publish` command
    /// and the front half of `run`.
    pub async fn publish_phase(&self, options: &PipelineOptions) -> Result<RepoRef> {
        let repo = self.provision(options).await?;
        if !options.skip_publish {
            self.publish_source(options, &repo)?;
            self.install_and_register(options, &repo).await?;
        }
        Ok(repo)
    }

    /// Download artifacts from the latest release without building. The
    /// repository must already exist under the authenticated user.
    pub async fn fetch_phase(
        &self,
        options: &PipelineOptions,
    ) -> Result<(RepoRef, Vec<(Platform, PathBuf)>)> {
        self.check_cancel()?;
        let owner = self.client.authenticated_user().await?;
        let repo = RepoRef::new(owner, options.repo_name.clone());
        let artifacts = self.fetch_artifacts(options, &repo).await?;
        Ok((repo, artifacts))
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    fn stage_started(&self, stage: Stage) -> Result<()> {
        self.check_cancel()?;
        self.events.emit(PipelineEvent::StageStarted(stage));
        Ok(())
    }

    fn stage_finished(&self, stage: Stage) {
        self.events.emit(PipelineEvent::StageFinished(stage));
    }

    async fn provision(&self, options: &PipelineOptions) -> Result<RepoRef> {
        self.stage_started(Stage::Provision)?;

        let repo = self.client.ensure_repo(&options.repo_name).await?;
        self.client.set_actions_permissions(&repo).await?;

        if !options.skip_clean_runs {
            // Old recorded runs would pollute candidate selection displays;
            // cleaning is best effort and never blocks the build.
            if let Err(e) = self.client.delete_old_runs(&repo).await {
                warn!(error = %e, "could not clean old workflow runs");
            }
        }

        self.stage_finished(Stage::Provision);
        Ok(repo)
    }

    fn publish_source(&self, options: &PipelineOptions, repo: &RepoRef) -> Result<()> {
        self.stage_started(Stage::Publish)?;

        let result = publish(&PublishRequest {
            project_path: options.project_path.clone(),
            targets: self.targets(options, repo),
            branch: options.branch.clone(),
            message: "Publish source".to_string(),
            include: options.include.clone(),
            exclude: options.exclude.clone(),
        })?;

        match result.commit {
            CommitOutcome::Created(id) => {
                self.events
                    .emit(PipelineEvent::Message(format!("published commit {}", id)))
            }
            CommitOutcome::NoChanges => self
                .events
                .emit(PipelineEvent::Message("source unchanged".to_string())),
        }

        self.stage_finished(Stage::Publish);
        Ok(())
    }

    /// Write the workflow definition, push it, and wait for the CI system to
    /// register it. Registration is eventually consistent after a push, so
    /// this polls under its own short budget instead of sleeping blindly.
    async fn install_and_register(&self, options: &PipelineOptions, repo: &RepoRef) -> Result<()> {
        self.stage_started(Stage::InstallWorkflow)?;

        let content = FlutterWorkflowTemplate::new().render(&options.workflow_spec());
        let path = install_workflow(&options.project_path, &content)?;
        info!(path = %path.display(), "workflow definition installed");

        publish(&PublishRequest {
            project_path: options.project_path.clone(),
            targets: self.targets(options, repo),
            branch: options.branch.clone(),
            message: "Install build workflow".to_string(),
            include: options.include.clone(),
            exclude: options.exclude.clone(),
        })?;

        let budget = PollBudget::start(options.settle_timeout, options.settle_interval);
        loop {
            self.check_cancel()?;
            if budget.expired() {
                return Err(PipelineError::Timeout {
                    elapsed_secs: budget.elapsed().as_secs(),
                    last_state: "awaiting workflow registration".to_string(),
                });
            }

            match self.client.list_workflows(repo).await {
                Ok(workflows) if workflows.iter().any(|w| w.matches_file(WORKFLOW_FILE_NAME)) => {
                    break;
                }
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "transient API failure while awaiting registration")
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(budget.interval).await;
        }

        self.stage_finished(Stage::InstallWorkflow);
        Ok(())
    }

    /// Trigger the run. The registration check above can still race the CI
    /// system's dispatch index, so a not-registered rejection is retried
    /// exactly once after one settle interval.
    async fn dispatch(
        &self,
        options: &PipelineOptions,
        repo: &RepoRef,
    ) -> Result<chrono::DateTime<chrono::Utc>> {
        self.stage_started(Stage::Dispatch)?;

        let dispatched_at = match self
            .client
            .dispatch(repo, WORKFLOW_FILE_NAME, &options.branch)
            .await
        {
            Ok(at) => at,
            Err(e @ airlift_github::HubError::WorkflowNotRegistered(_)) => {
                warn!(error = %e, "dispatch rejected, retrying once");
                tokio::time::sleep(options.settle_interval).await;
                self.check_cancel()?;
                self.client
                    .dispatch(repo, WORKFLOW_FILE_NAME, &options.branch)
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        self.stage_finished(Stage::Dispatch);
        Ok(dispatched_at)
    }

    async fn monitor(
        &self,
        options: &PipelineOptions,
        repo: &RepoRef,
        dispatched_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<WorkflowRun> {
        self.stage_started(Stage::Monitor)?;

        let budget = PollBudget::start(options.timeout, options.poll_interval);
        let outcome = monitor_run(
            self.client,
            repo,
            WORKFLOW_FILE_NAME,
            &options.branch,
            dispatched_at,
            budget,
            self.events,
            self.cancel,
        )
        .await?;

        let run = match outcome {
            RunOutcome::Succeeded(run) => run,
            RunOutcome::Failed(run) => {
                // Surface the failing steps before reporting the error
                self.collect_logs_best_effort(repo, run.id).await;
                return Err(PipelineError::BuildFailed {
                    run_id: run.id,
                    conclusion: run
                        .conclusion
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                });
            }
            RunOutcome::Cancelled(run) => {
                return Err(PipelineError::BuildCancelled { run_id: run.id })
            }
            RunOutcome::TimedOut { last_state } => {
                return Err(PipelineError::Timeout {
                    elapsed_secs: options.timeout.as_secs(),
                    last_state,
                })
            }
            RunOutcome::Interrupted => return Err(PipelineError::Cancelled),
        };

        self.stage_finished(Stage::Monitor);
        Ok(run)
    }

    async fn fetch_artifacts(
        &self,
        options: &PipelineOptions,
        repo: &RepoRef,
    ) -> Result<Vec<(Platform, PathBuf)>> {
        self.stage_started(Stage::FetchArtifacts)?;

        let mut artifacts = Vec::with_capacity(options.platforms.len());
        for &platform in &options.platforms {
            self.check_cancel()?;
            let (asset, path) = self
                .client
                .fetch_artifact(
                    repo,
                    platform.artifact_extension(),
                    &options.build_dir,
                    self.events,
                )
                .await?;
            self.events.emit(PipelineEvent::Message(format!(
                "downloaded {} for {}",
                asset.name, platform
            )));
            artifacts.push((platform, path));
        }

        self.stage_finished(Stage::FetchArtifacts);
        Ok(artifacts)
    }

    /// Log retrieval explains an outcome; it never replaces one. A failure
    /// here is reported and swallowed.
    async fn collect_logs_best_effort(&self, repo: &RepoRef, run_id: u64) {
        if let Err(e) = self.collect_logs(repo, run_id).await {
            warn!(error = %e, "could not collect run logs");
        }
    }

    async fn collect_logs(&self, repo: &RepoRef, run_id: u64) -> Result<()> {
        self.stage_started(Stage::CollectLogs)?;

        for entry in self.client.collect_run_logs(repo, run_id).await? {
            self.events.emit(PipelineEvent::LogFile {
                name: entry.name,
                content: entry.content,
            });
        }

        self.stage_finished(Stage::CollectLogs);
        Ok(())
    }

    fn targets(&self, options: &PipelineOptions, repo: &RepoRef) -> Vec<RemoteTarget> {
        let mut targets = vec![RemoteTarget::github(&repo.owner, &repo.name)];
        for owner in &options.extra_remotes {
            targets.push(RemoteTarget::github(owner, &repo.name));
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airlift_core::config::Config;
    use airlift_core::NullSink;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::path::Path;

    /// Minimal local API stub: answers the provisioning endpoints with
    /// canned JSON and everything else with 404, one connection at a time.
    fn spawn_api_stub() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut reader = BufReader::new(match stream.try_clone() {
                    Ok(clone) => clone,
                    Err(_) => continue,
                });

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).is_err() || line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap_or(0);
                    }
                }
                if content_length > 0 {
                    let mut body = vec![0u8; content_length];
                    let _ = reader.read_exact(&mut body);
                }

                let (status, body) = if request_line.starts_with("GET /user ") {
                    ("200 OK", r#"{"login":"acme"}"#)
                } else if request_line.starts_with("GET /repos/acme/app ") {
                    ("200 OK", r#"{"name":"app","owner":{"login":"acme"}}"#)
                } else if request_line.starts_with("PUT /repos/acme/app/actions/permissions ") {
                    ("200 OK", "{}")
                } else {
                    ("404 Not Found", r#"{"message":"Not Found"}"#)
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        base
    }

    #[tokio::test]
    async fn test_skip_build_skips_dispatch_and_download() {
        let client = HubClient::new("test-token").with_api_base(spawn_api_stub());
        let cancel = CancelFlag::new();
        let pipeline = BuildPipeline::new(&client, &NullSink, &cancel);

        let mut options =
            PipelineOptions::from_config(Path::new("/work/app"), &Config::default()).unwrap();
        options.skip_publish = true;
        options.skip_build = true;
        options.skip_clean_runs = true;

        // Any dispatch, monitor, or release request would hit the stub's 404
        // and fail the run; skipping the build must touch none of them.
        let report = pipeline.run(&options).await.unwrap();
        assert_eq!(report.repo.full_name(), "acme/app");
        assert!(report.run.is_none());
        assert!(report.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_log_collection_failure_is_not_fatal() {
        // Nothing listens on port 1; the download fails with a transport
        // error and the best-effort wrapper swallows it
        let client = HubClient::new("test-token").with_api_base("http://127.0.0.1:1");
        let cancel = CancelFlag::new();
        let pipeline = BuildPipeline::new(&client, &NullSink, &cancel);

        pipeline
            .collect_logs_best_effort(&RepoRef::new("acme", "app"), 7)
            .await;
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_any_stage() {
        let client = HubClient::new("test-token");
        let cancel = CancelFlag::new();
        cancel.cancel();

        let pipeline = BuildPipeline::new(&client, &NullSink, &cancel);
        let options =
            PipelineOptions::from_config(Path::new("/work/my_app"), &Config::default()).unwrap();

        // Must fail on the flag check without touching the network
        let result = pipeline.run(&options).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_targets_include_extra_remotes() {
        let client = HubClient::new("test-token");
        let cancel = CancelFlag::new();
        let pipeline = BuildPipeline::new(&client, &NullSink, &cancel);

        let mut config = Config::default();
        config.github.remotes = vec!["mirror-org".to_string()];
        let options =
            PipelineOptions::from_config(Path::new("/work/my_app"), &config).unwrap();
        let repo = RepoRef::new("acme", "my_app");

        let targets = pipeline.targets(&options, &repo);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].push_url, "https://github.com/acme/my_app.git");
        assert_eq!(targets[1].push_url, "https://github.com/mirror-org/my_app.git");
    }
}
