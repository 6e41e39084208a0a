//! Fetch command

use clap::Args;
use tracing::info;

use airlift_core::CancelFlag;
use airlift_github::HubClient;
use airlift_pipeline::BuildPipeline;

use crate::cli::commands::{cancel_on_ctrl_c, ProjectArgs};
use crate::cli::output::{self, ConsoleSink};
use crate::cli::Cli;

/// Download artifacts from the latest remote release
#[derive(Debug, Args)]
pub struct FetchCommand {
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl FetchCommand {
    /// Execute the fetch command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing fetch command");

        let options = self.project.resolve()?;

        let client = HubClient::new(&self.project.token);
        let cancel = CancelFlag::new();
        let sink = ConsoleSink::new(cli.quiet);

        let rt = tokio::runtime::Runtime::new()?;
        let (repo, artifacts) = rt.block_on(async {
            cancel_on_ctrl_c(&cancel);
            BuildPipeline::new(&client, &sink, &cancel)
                .fetch_phase(&options)
                .await
        })?;

        if !cli.quiet {
            output::success(&format!("fetched artifacts from {}", repo));
            for (platform, path) in &artifacts {
                println!(
                    "{}",
                    output::key_value(&platform.to_string(), &path.display().to_string())
                );
            }
        }
        Ok(())
    }
}
