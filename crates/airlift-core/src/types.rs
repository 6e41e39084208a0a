//! Shared types for Airlift

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Build target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iOS build on a macOS runner
    Ios,
    /// Android build on a Linux runner
    Android,
}

impl Platform {
    /// Artifact file extension produced by this platform's build job
    pub fn artifact_extension(&self) -> &'static str {
        match self {
            Platform::Ios => ".ipa",
            Platform::Android => ".apk",
        }
    }

    /// Default artifact file name for this platform
    pub fn default_artifact_name(&self) -> &'static str {
        match self {
            Platform::Ios => "FlutterIpaExport.ipa",
            Platform::Android => "FlutterApkExport.apk",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("unknown platform '{}' (expected ios or android)", other)),
        }
    }
}

/// Specification of the CI workflow to install.
///
/// Rendered to a single declarative workflow document; exactly one such
/// document exists in the repository's workflow directory after install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSpec {
    /// Platforms to build, one job each
    pub platforms: Vec<Platform>,
    /// Artifact file name per platform
    pub artifact_names: BTreeMap<Platform, String>,
    /// Branch the workflow is dispatched against
    pub branch: String,
}

impl WorkflowSpec {
    /// Create a spec for the given platforms with default artifact names
    pub fn new(platforms: Vec<Platform>, branch: impl Into<String>) -> Self {
        let artifact_names = platforms
            .iter()
            .map(|p| (*p, p.default_artifact_name().to_string()))
            .collect();
        Self {
            platforms,
            artifact_names,
            branch: branch.into(),
        }
    }

    /// Override the artifact name for a platform
    pub fn with_artifact_name(mut self, platform: Platform, name: impl Into<String>) -> Self {
        self.artifact_names.insert(platform, name.into());
        self
    }

    /// Artifact name for a platform, falling back to the platform default
    pub fn artifact_name(&self, platform: Platform) -> &str {
        self.artifact_names
            .get(&platform)
            .map(|s| s.as_str())
            .unwrap_or_else(|| platform.default_artifact_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!("ios".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Android);
        assert!("windows".parse::<Platform>().is_err());
    }

    #[test]
    fn test_artifact_extension() {
        assert_eq!(Platform::Ios.artifact_extension(), ".ipa");
        assert_eq!(Platform::Android.artifact_extension(), ".apk");
    }

    #[test]
    fn test_spec_artifact_names() {
        let spec = WorkflowSpec::new(vec![Platform::Ios, Platform::Android], "main")
            .with_artifact_name(Platform::Ios, "MyApp.ipa");

        assert_eq!(spec.artifact_name(Platform::Ios), "MyApp.ipa");
        assert_eq!(spec.artifact_name(Platform::Android), "FlutterApkExport.apk");
    }
}
