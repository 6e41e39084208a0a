//! Airlift pipeline - remote build orchestration
//!
//! Drives a Flutter project through a remote CI build: the source tree is
//! published to a GitHub repository, a build workflow is installed and
//! dispatched, the run is tracked to completion, and the release artifacts
//! are downloaded locally.

mod error;
mod options;
mod pipeline;

pub use error::{PipelineError, Result};
pub use options::PipelineOptions;
pub use pipeline::{BuildPipeline, PipelineReport};
