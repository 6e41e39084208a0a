//! Build command

use std::time::Duration;

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

/// Publish the project and run a full remote build
#[derive(Debug, Args)]
pub struct BuildCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Reuse the published tree instead of pushing the source again
    #[arg(long)]
    pub skip_publish: bool,

    /// Download existing artifacts without dispatching a new run
    #[arg(long)]
    pub skip_build: bool,

    /// Keep previously recorded workflow runs
    #[arg(long)]
    pub keep_runs: bool,

    /// Dump the run logs after completion
    #[arg(long)]
    pub logs: bool,

    /// Build timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Run poll interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl BuildCommand {
    /// Execute the build command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            skip_publish = self.skip_publish,
            skip_build = self.skip_build,
            "executing build command"
        );

        let mut options = self.project.resolve()?;
        options.skip_publish = self.skip_publish;
        options.skip_build = self.skip_build;
        options.skip_clean_runs = self.keep_runs;
        options.verbose_logs = self.logs || cli.verbose;
        if let Some(timeout) = self.timeout {
            options.timeout = Duration::from_secs(timeout);
        }
        if let Some(interval) = self.poll_interval {
            options.poll_interval = Duration::from_secs(interval);
        }

        if !self.yes && !cli.quiet {
            let proceed = Confirm::new()
                .with_prompt(format!(
                    "Publish {} and build remotely in repository '{}'?",
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
        let report = rt.block_on(async {
            cancel_on_ctrl_c(&cancel);
            BuildPipeline::new(&client, &sink, &cancel)
                .run(&options)
                .await
        })?;

        if !cli.quiet {
            println!();
            output::success(&format!("remote build complete in {}", report.repo));
            if let Some(run) = &report.run {
                println!("{}", output::key_value("run", &run.id.to_string()));
            }
            for (platform, path) in &report.artifacts {
                println!(
                    "{}",
                    output::key_value(&platform.to_string(), &path.display().to_string())
                );
            }
        }

        Ok(())
    }
}
