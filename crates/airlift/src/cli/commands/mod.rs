//! CLI commands

mod build;
mod doctor;
mod fetch;
mod logs;
mod publish;

pub use build::BuildCommand;
pub use doctor::DoctorCommand;
pub use fetch::FetchCommand;
pub use logs::LogsCommand;
pub use publish::PublishCommand;

use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use tracing::debug;

use airlift_core::config::{load_config_or_default, validate_config};
use airlift_core::{CancelFlag, Platform};
use airlift_pipeline::PipelineOptions;

/// Arguments shared by every command that resolves a project
#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Remote repository name (defaults to the configured or directory name)
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch to publish and dispatch against
    #[arg(long)]
    pub branch: Option<String>,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Directory downloaded artifacts are written to
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Platform to build; repeat for several (ios, android)
    #[arg(long = "platform", value_parser = Platform::from_str)]
    pub platforms: Vec<Platform>,
}

impl ProjectArgs {
    /// Load and validate configuration, then apply command-line overrides
    pub fn resolve(&self) -> anyhow::Result<PipelineOptions> {
        let project_path = match &self.path {
            Some(path) => path.canonicalize()?,
            None => std::env::current_dir()?,
        };

        let (mut config, config_path) = load_config_or_default(&project_path);
        if let Some(path) = &config_path {
            debug!(path = %path.display(), "loaded configuration");
        }

        if let Some(repo) = &self.repo {
            config.github.repo = Some(repo.clone());
        }
        if let Some(branch) = &self.branch {
            config.github.branch = branch.clone();
        }
        if let Some(build_dir) = &self.build_dir {
            config.build.build_dir = build_dir.clone();
        }
        if !self.platforms.is_empty() {
            config.build.platforms = self.platforms.clone();
        }

        validate_config(&config)?;
        Ok(PipelineOptions::from_config(&project_path, &config)?)
    }
}

/// Install a Ctrl-C handler that trips the flag. The first interrupt
/// requests a cooperative stop; a second one aborts the process.
pub fn cancel_on_ctrl_c(cancel: &CancelFlag) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(crate::exit_codes::CANCELLED);
            }
        }
    });
}
