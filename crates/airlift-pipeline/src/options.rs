//! Pipeline options derived from configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use airlift_core::config::Config;
use airlift_core::{ConfigError, Platform, WorkflowSpec};

use crate::error::Result;

/// Fully resolved inputs for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Local project directory
    pub project_path: PathBuf,
    /// Remote repository name under the authenticated user
    pub repo_name: String,
    /// Branch to publish and dispatch against
    pub branch: String,
    /// Platforms to build
    pub platforms: Vec<Platform>,
    /// Artifact file name per platform
    pub artifact_names: BTreeMap<Platform, String>,
    /// Pathspecs to stage; empty stages the full tree
    pub include: Vec<String>,
    /// Pathspecs to unstage after staging
    pub exclude: Vec<String>,
    /// Additional owners whose same-named repositories also receive the push
    pub extra_remotes: Vec<String>,
    /// Directory downloaded artifacts are written to
    pub build_dir: PathBuf,
    /// Hard budget for tracking the run
    pub timeout: Duration,
    /// Delay between run polls
    pub poll_interval: Duration,
    /// Budget for the workflow-registration check after publishing
    pub settle_timeout: Duration,
    /// Delay between registration checks
    pub settle_interval: Duration,
    /// Skip publishing the source tree (reuse what the remote already has)
    pub skip_publish: bool,
    /// Skip dispatch and monitoring (download existing artifacts only)
    pub skip_build: bool,
    /// Skip deleting recorded runs before dispatching
    pub skip_clean_runs: bool,
    /// Collect and emit run logs even when the build succeeds
    pub verbose_logs: bool,
}

impl PipelineOptions {
    /// Resolve options from a validated configuration.
    ///
    /// The repository name falls back to the project directory name when the
    /// configuration does not pin one.
    pub fn from_config(project_path: &Path, config: &Config) -> Result<Self> {
        let repo_name = match &config.github.repo {
            Some(name) => name.clone(),
            None => project_path
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "github.repo".to_string(),
                    message: "no repository name configured and the project path has no usable directory name".to_string(),
                })?,
        };

        let build_dir = if config.build.build_dir.is_absolute() {
            config.build.build_dir.clone()
        } else {
            project_path.join(&config.build.build_dir)
        };

        Ok(Self {
            project_path: project_path.to_path_buf(),
            repo_name,
            branch: config.github.branch.clone(),
            platforms: config.build.platforms.clone(),
            artifact_names: config.build.artifact_names.clone(),
            include: config.publish.include.clone(),
            exclude: config.publish.exclude.clone(),
            extra_remotes: config.github.remotes.clone(),
            build_dir,
            timeout: Duration::from_secs(config.build.timeout_secs),
            poll_interval: Duration::from_secs(config.build.poll_interval_secs),
            settle_timeout: Duration::from_secs(config.build.settle_timeout_secs),
            settle_interval: Duration::from_secs(config.build.settle_interval_secs),
            skip_publish: false,
            skip_build: false,
            skip_clean_runs: false,
            verbose_logs: false,
        })
    }

    /// Workflow description rendered into the CI definition
    pub fn workflow_spec(&self) -> WorkflowSpec {
        let mut spec = WorkflowSpec::new(self.platforms.clone(), self.branch.clone());
        for (platform, name) in &self.artifact_names {
            spec = spec.with_artifact_name(*platform, name.clone());
        }
        spec
    }

    /// Artifact file name for a platform, configured or platform default
    pub fn artifact_name(&self, platform: Platform) -> String {
        self.artifact_names
            .get(&platform)
            .cloned()
            .unwrap_or_else(|| platform.default_artifact_name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_falls_back_to_directory() {
        let config = Config::default();
        let options = PipelineOptions::from_config(Path::new("/work/my_app"), &config).unwrap();
        assert_eq!(options.repo_name, "my_app");
    }

    #[test]
    fn test_configured_repo_name_wins() {
        let mut config = Config::default();
        config.github.repo = Some("release-build".to_string());
        let options = PipelineOptions::from_config(Path::new("/work/my_app"), &config).unwrap();
        assert_eq!(options.repo_name, "release-build");
    }

    #[test]
    fn test_build_dir_resolves_relative_to_project() {
        let config = Config::default();
        let options = PipelineOptions::from_config(Path::new("/work/my_app"), &config).unwrap();
        assert_eq!(options.build_dir, PathBuf::from("/work/my_app/builds"));
    }

    #[test]
    fn test_durations_from_seconds() {
        let mut config = Config::default();
        config.build.timeout_secs = 600;
        config.build.poll_interval_secs = 10;
        let options = PipelineOptions::from_config(Path::new("/work/my_app"), &config).unwrap();
        assert_eq!(options.timeout, Duration::from_secs(600));
        assert_eq!(options.poll_interval, Duration::from_secs(10));
    }
}
