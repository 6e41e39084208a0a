//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::Platform;

use super::defaults::{
    DEFAULT_BRANCH, DEFAULT_BUILD_DIR, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SETTLE_INTERVAL_SECS,
    DEFAULT_SETTLE_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};

/// Main configuration for Airlift
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project name (informational)
    pub name: Option<String>,

    /// GitHub repository configuration
    pub github: GithubConfig,

    /// Source publishing configuration
    pub publish: PublishConfig,

    /// Remote build configuration
    pub build: BuildConfig,
}

/// GitHub repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Repository name under the authenticated user
    pub repo: Option<String>,

    /// Branch to publish and dispatch against
    pub branch: String,

    /// Additional remote owners to fan-out push to
    pub remotes: Vec<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            repo: None,
            branch: DEFAULT_BRANCH.to_string(),
            remotes: Vec::new(),
        }
    }
}

/// Source publishing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Pathspecs to stage; empty means the full tree
    pub include: Vec<String>,

    /// Pathspecs to unstage after a full-tree stage (files stay on disk)
    pub exclude: Vec<String>,
}

/// Remote build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Platforms to build
    pub platforms: Vec<Platform>,

    /// Artifact file name per platform
    pub artifact_names: BTreeMap<Platform, String>,

    /// Directory downloaded artifacts are written to
    pub build_dir: PathBuf,

    /// Build timeout in seconds
    pub timeout_secs: u64,

    /// Run poll interval in seconds
    pub poll_interval_secs: u64,

    /// Budget for the workflow-registration settle check, in seconds
    pub settle_timeout_secs: u64,

    /// Interval between settle checks, in seconds
    pub settle_interval_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            platforms: vec![Platform::Ios],
            artifact_names: BTreeMap::new(),
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            settle_timeout_secs: DEFAULT_SETTLE_TIMEOUT_SECS,
            settle_interval_secs: DEFAULT_SETTLE_INTERVAL_SECS,
        }
    }
}
