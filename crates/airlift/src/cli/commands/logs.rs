//! Logs command

use clap::Args;
use console::style;
use tracing::info;

use airlift_core::WORKFLOW_FILE_NAME;
use airlift_github::{HubClient, RepoRef};

use crate::cli::commands::ProjectArgs;
use crate::cli::Cli;

/// Print the logs of a remote build run
#[derive(Debug, Args)]
pub struct LogsCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Run id (defaults to the newest run of the build workflow)
    #[arg(long)]
    pub run: Option<u64>,
}

impl LogsCommand {
    /// Execute the logs command
    pub fn execute(&self, _cli: &Cli) -> anyhow::Result<()> {
        info!(run = ?self.run, "executing logs command");

        let options = self.project.resolve()?;
        let client = HubClient::new(&self.project.token);

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            let owner = client.authenticated_user().await?;
            let repo = RepoRef::new(owner, options.repo_name.clone());

            let run_id = match self.run {
                Some(id) => id,
                None => newest_run(&client, &repo).await?,
            };

            for entry in client.collect_run_logs(&repo, run_id).await? {
                println!("{}", style(format!("--- {} ---", entry.name)).dim());
                println!("{}", entry.content);
            }
            Ok(())
        })
    }
}

/// Id of the most recently created run of the build workflow
async fn newest_run(client: &HubClient, repo: &RepoRef) -> anyhow::Result<u64> {
    let workflows = client.list_workflows(repo).await?;
    let workflow = workflows
        .iter()
        .find(|w| w.matches_file(WORKFLOW_FILE_NAME))
        .ok_or_else(|| anyhow::anyhow!("no build workflow registered in {}", repo))?;

    let runs = client.list_runs(repo, workflow.id, None).await?;
    runs.into_iter()
        .max_by_key(|run| (run.created_at, run.id))
        .map(|run| run.id)
        .ok_or_else(|| anyhow::anyhow!("no runs recorded for the build workflow in {}", repo))
}
