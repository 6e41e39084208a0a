//! Progress events and cooperative cancellation
//!
//! Every pipeline stage reports through an explicit [`EventSink`] rather than
//! writing to a shared console. The CLI installs a styled console sink; an
//! embedding front-end can install a [`ChannelSink`] and consume the ordered
//! event stream on another thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// A pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Ensure the remote repository exists
    Provision,
    /// Push the project tree to the remote targets
    Publish,
    /// Install the CI workflow definition
    InstallWorkflow,
    /// Request a workflow run
    Dispatch,
    /// Track the run to a terminal state
    Monitor,
    /// Download build artifacts
    FetchArtifacts,
    /// Collect run logs
    CollectLogs,
}

impl Stage {
    /// Human-readable stage name
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Provision => "provision repository",
            Stage::Publish => "publish source",
            Stage::InstallWorkflow => "install workflow",
            Stage::Dispatch => "dispatch workflow",
            Stage::Monitor => "monitor run",
            Stage::FetchArtifacts => "fetch artifacts",
            Stage::CollectLogs => "collect logs",
        }
    }
}

/// Progress event emitted by pipeline stages
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A stage began executing
    StageStarted(Stage),
    /// A stage finished successfully
    StageFinished(Stage),
    /// Free-form progress message
    Message(String),
    /// Bytes received during an artifact download
    DownloadProgress {
        /// Bytes received so far
        received: u64,
        /// Total size if the server reported one
        total: Option<u64>,
    },
    /// One decoded log file from a run's log bundle
    LogFile {
        /// Entry name inside the bundle
        name: String,
        /// Decoded text (lossy)
        content: String,
    },
}

/// Sink for pipeline progress events
pub trait EventSink: Send + Sync {
    /// Deliver one event. Implementations must not block for long; event
    /// volume is small and consumption is near-immediate.
    fn emit(&self, event: PipelineEvent);
}

/// Sink that discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Sink that forwards events over an mpsc channel (single producer, single
/// consumer). Send failures mean the consumer is gone; events are dropped.
pub struct ChannelSink {
    tx: Sender<PipelineEvent>,
}

impl ChannelSink {
    /// Wrap a channel sender
    pub fn new(tx: Sender<PipelineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Shared cancellation flag.
///
/// Checked at each stage boundary and each poll tick. Tripping it abandons
/// the pipeline without rolling back remote side effects.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, untripped flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());

        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_channel_sink_ordering() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);

        sink.emit(PipelineEvent::StageStarted(Stage::Provision));
        sink.emit(PipelineEvent::Message("working".to_string()));
        sink.emit(PipelineEvent::StageFinished(Stage::Provision));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], PipelineEvent::StageStarted(Stage::Provision)));
        assert!(matches!(events[2], PipelineEvent::StageFinished(Stage::Provision)));
    }

    #[test]
    fn test_channel_sink_dropped_consumer() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let sink = ChannelSink::new(tx);
        // Must not panic when the consumer is gone
        sink.emit(PipelineEvent::Message("late".to_string()));
    }
}
