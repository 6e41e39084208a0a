//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{BuildCommand, DoctorCommand, FetchCommand, LogsCommand, PublishCommand};

/// Airlift - remote Flutter build CLI
#[derive(Debug, Parser)]
#[command(name = "airlift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish the project and run a full remote build
    Build(BuildCommand),

    /// Publish the project source and workflow without building
    Publish(PublishCommand),

    /// Download artifacts from the latest remote release
    Fetch(FetchCommand),

    /// Print the logs of a remote build run
    Logs(LogsCommand),

    /// Check the environment for required tools and credentials
    Doctor(DoctorCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Build(ref cmd) => cmd.execute(&self),
            Commands::Publish(ref cmd) => cmd.execute(&self),
            Commands::Fetch(ref cmd) => cmd.execute(&self),
            Commands::Logs(ref cmd) => cmd.execute(&self),
            Commands::Doctor(ref cmd) => cmd.execute(&self),
        }
    }
}
