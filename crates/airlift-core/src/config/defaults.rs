//! Default configuration values

/// Default branch to publish and dispatch against
pub const DEFAULT_BRANCH: &str = "main";

/// Default directory for downloaded build artifacts
pub const DEFAULT_BUILD_DIR: &str = "builds";

/// Default build timeout in seconds (30 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Default run poll interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default budget for the workflow-registration settle check, in seconds
pub const DEFAULT_SETTLE_TIMEOUT_SECS: u64 = 60;

/// Default interval between settle checks, in seconds
pub const DEFAULT_SETTLE_INTERVAL_SECS: u64 = 5;

/// Configuration file names searched for, in preference order
pub fn config_file_names() -> &'static [&'static str] {
    &["airlift.toml", "airlift.yaml", "airlift.yml"]
}
