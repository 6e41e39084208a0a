//! Publish command

use clap::Args;
use console::style;
use dialoguer::Confirm;
use tracing::info;

use airlift_core::CancelFlag;
use airlift_github::HubClient;
use airlift_pipeline::BuildPipeline;

use crate::cli::commands::{cancel_on_ctrl_c, ProjectArgs};
use crate::cli::output::{self, ConsoleSink};
use crate::cli::Cli;

/// Publish the project source and workflow without building
#[derive(Debug, Args)]
pub struct PublishCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing publish command");

        let options = self.project.resolve()?;

        if !self.yes && !cli.quiet {
            let proceed = Confirm::new()
                .with_prompt(format!(
                    "Publish {} to repository '{}'?",
                    style(options.project_path.display()).cyan(),
                    style(&options.repo_name).yellow()
                ))
                .default(true)
                .interact()?;
            if !proceed {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        let client = HubClient::new(&self.project.token);
        let cancel = CancelFlag::new();
        let sink = ConsoleSink::new(cli.quiet);

        let rt = tokio::runtime::Runtime::new()?;
        let repo = rt.block_on(async {
            cancel_on_ctrl_c(&cancel);
            BuildPipeline::new(&client, &sink, &cancel)
                .publish_phase(&options)
                .await
        })?;

        if !cli.quiet {
            output::success(&format!("published to {}", repo));
        }
        Ok(())
    }
}
