//! Doctor command - check the environment for required tools and credentials

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use airlift_core::config::{find_config, load_config};

use crate::cli::Cli;

/// Check the environment for required tools and credentials
#[derive(Debug, Args)]
pub struct DoctorCommand {
    /// Project directory (defaults to the current directory)
    pub path: Option<PathBuf>,
}

/// Status of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    message: String,
}

impl DoctorCommand {
    /// Execute the doctor command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing doctor command");

        let project_path = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir()?,
        };

        let checks = vec![
            check_binary("git", CheckStatus::Fail),
            check_binary("flutter", CheckStatus::Warn),
            check_token(),
            check_config(&project_path),
        ];

        if !cli.quiet {
            for check in &checks {
                let mark = match check.status {
                    CheckStatus::Ok => style("✓").green().bold(),
                    CheckStatus::Warn => style("!").yellow().bold(),
                    CheckStatus::Fail => style("✗").red().bold(),
                };
                println!("{} {}: {}", mark, style(check.name).bold(), check.message);
            }
        }

        let failures = checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count();
        if failures > 0 {
            anyhow::bail!("{} check(s) failed; fix them before building", failures);
        }
        Ok(())
    }
}

/// Look up a binary on PATH; missing binaries report `missing_status`
fn check_binary(name: &'static str, missing_status: CheckStatus) -> CheckResult {
    match which::which(name) {
        Ok(path) => CheckResult {
            name,
            status: CheckStatus::Ok,
            message: path.display().to_string(),
        },
        Err(_) => CheckResult {
            name,
            status: missing_status,
            message: "not found on PATH".to_string(),
        },
    }
}

fn check_token() -> CheckResult {
    let set = std::env::var("GITHUB_TOKEN").is_ok_and(|t| !t.trim().is_empty());
    CheckResult {
        name: "GITHUB_TOKEN",
        status: if set { CheckStatus::Ok } else { CheckStatus::Fail },
        message: if set {
            "configured".to_string()
        } else {
            "not set".to_string()
        },
    }
}

fn check_config(project_path: &std::path::Path) -> CheckResult {
    match find_config(project_path) {
        Some(path) => match load_config(&path) {
            Ok(_) => CheckResult {
                name: "configuration",
                status: CheckStatus::Ok,
                message: path.display().to_string(),
            },
            Err(e) => CheckResult {
                name: "configuration",
                status: CheckStatus::Fail,
                message: e.to_string(),
            },
        },
        None => CheckResult {
            name: "configuration",
            status: CheckStatus::Warn,
            message: "no airlift.toml/airlift.yaml found; defaults apply".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_missing_binary_reports_requested_status() {
        let result = check_binary("definitely-not-a-real-tool", CheckStatus::Warn);
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[test]
    fn test_check_config_without_file_warns() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = check_config(dir.path());
        assert_eq!(result.status, CheckStatus::Warn);
    }
}
