//! Airlift Core - Core library for remote build orchestration
//!
//! This crate provides the foundational types, error handling, configuration,
//! workflow template rendering, and progress/cancellation primitives for the
//! Airlift build orchestration tool.

pub mod config;
pub mod error;
pub mod events;
pub mod templates;
pub mod types;

pub use error::{AirliftError, ConfigError, GitError, Result};
pub use events::{CancelFlag, ChannelSink, EventSink, NullSink, PipelineEvent, Stage};
pub use templates::{install_workflow, FlutterWorkflowTemplate, WORKFLOW_FILE_NAME};
pub use types::{Platform, WorkflowSpec};
