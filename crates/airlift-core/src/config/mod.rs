//! Configuration loading and types

mod defaults;
mod loader;
mod types;
mod validation;

pub use defaults::{config_file_names, DEFAULT_BRANCH, DEFAULT_BUILD_DIR, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SETTLE_INTERVAL_SECS, DEFAULT_SETTLE_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
pub use loader::{find_config, load_config, load_config_from_dir, load_config_or_default};
pub use types::{BuildConfig, Config, GithubConfig, PublishConfig};
pub use validation::validate_config;
