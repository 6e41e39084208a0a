//! Workflow run tracking
//!
//! The CI system registers workflows and creates runs asynchronously, so the
//! monitor treats all remote state as eventually visible: it polls on a fixed
//! interval under a hard time budget and re-evaluates the candidate run on
//! every tick. A run is a candidate when it was manually dispatched on the
//! tracked branch and created no earlier than the dispatch timestamp; among
//! candidates the newest one wins.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use airlift_core::{CancelFlag, EventSink, PipelineEvent};

use crate::actions::ActionsApi;
use crate::error::Result;
use crate::types::{RepoRef, RunConclusion, RunStatus, WorkflowRun};

/// Hard time budget for a polling loop
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    /// Maximum wall-clock time to keep polling
    pub timeout: Duration,
    /// Delay between polls
    pub interval: Duration,
    started_at: Instant,
}

impl PollBudget {
    /// Start a budget now
    pub fn start(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            started_at: Instant::now(),
        }
    }

    /// Whether the budget is exhausted
    pub fn expired(&self) -> bool {
        self.started_at.elapsed() >= self.timeout
    }

    /// Time since the budget started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Observable phase of the monitor, reported in progress messages and in
/// timeout errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// The workflow file is not registered by the CI system yet
    AwaitingRegistration,
    /// The workflow is registered but no candidate run exists yet
    AwaitingRun,
    /// A candidate run exists and has not completed
    InProgress,
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorState::AwaitingRegistration => write!(f, "awaiting workflow registration"),
            MonitorState::AwaitingRun => write!(f, "awaiting run creation"),
            MonitorState::InProgress => write!(f, "run in progress"),
        }
    }
}

/// How a monitored run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The run completed successfully
    Succeeded(WorkflowRun),
    /// The run completed with a failure conclusion
    Failed(WorkflowRun),
    /// The run was cancelled on the CI side
    Cancelled(WorkflowRun),
    /// The poll budget expired before the run reached a terminal state
    TimedOut {
        /// Phase the monitor was in when the budget ran out
        last_state: String,
    },
    /// Cancellation was requested locally while tracking
    Interrupted,
}

/// Track the run triggered by a dispatch to a terminal state.
///
/// Transient API failures (rate limits, server errors, transport hiccups)
/// cost one tick and are retried; fatal failures abort immediately. The
/// number of polls never exceeds `timeout / interval` rounded up, plus one.
pub async fn monitor_run(
    api: &dyn ActionsApi,
    repo: &RepoRef,
    workflow_file: &str,
    branch: &str,
    dispatched_at: DateTime<Utc>,
    budget: PollBudget,
    events: &dyn EventSink,
    cancel: &CancelFlag,
) -> Result<RunOutcome> {
    let mut state = MonitorState::AwaitingRegistration;
    let mut workflow_id: Option<u64> = None;

    loop {
        if cancel.is_cancelled() {
            info!("run monitoring interrupted by cancellation");
            return Ok(RunOutcome::Interrupted);
        }
        if budget.expired() {
            warn!(elapsed_secs = budget.elapsed().as_secs(), %state, "poll budget exhausted");
            return Ok(RunOutcome::TimedOut {
                last_state: state.to_string(),
            });
        }

        match poll_once(api, repo, workflow_file, branch, dispatched_at, &mut workflow_id).await {
            Ok(Tick::NotRegistered) => {
                transition(&mut state, MonitorState::AwaitingRegistration, events);
            }
            Ok(Tick::NoCandidate) => {
                transition(&mut state, MonitorState::AwaitingRun, events);
            }
            Ok(Tick::Running(run)) => {
                debug!(run_id = run.id, status = ?run.status, "run not terminal yet");
                transition(&mut state, MonitorState::InProgress, events);
            }
            Ok(Tick::Terminal(run)) => {
                let conclusion = run.conclusion.unwrap_or(RunConclusion::Other);
                info!(run_id = run.id, %conclusion, "run reached terminal state");
                return Ok(match conclusion {
                    RunConclusion::Success => RunOutcome::Succeeded(run),
                    RunConclusion::Cancelled => RunOutcome::Cancelled(run),
                    _ => RunOutcome::Failed(run),
                });
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, "transient API failure, retrying next tick");
            }
            Err(e) => return Err(e),
        }

        tokio::time::sleep(budget.interval).await;
    }
}

enum Tick {
    NotRegistered,
    NoCandidate,
    Running(WorkflowRun),
    Terminal(WorkflowRun),
}

async fn poll_once(
    api: &dyn ActionsApi,
    repo: &RepoRef,
    workflow_file: &str,
    branch: &str,
    dispatched_at: DateTime<Utc>,
    workflow_id: &mut Option<u64>,
) -> Result<Tick> {
    // Registration is stable once observed, so the id is resolved only once.
    let id = match *workflow_id {
        Some(id) => id,
        None => {
            let workflows = api.list_workflows(repo).await?;
            match workflows.iter().find(|w| w.matches_file(workflow_file)) {
                Some(workflow) => {
                    debug!(workflow_id = workflow.id, workflow_file, "workflow registered");
                    *workflow_id = Some(workflow.id);
                    workflow.id
                }
                None => return Ok(Tick::NotRegistered),
            }
        }
    };

    let runs = api.list_dispatch_runs(repo, id, branch).await?;
    let candidate = runs
        .into_iter()
        .filter(|run| {
            run.head_branch == branch
                && run.event == "workflow_dispatch"
                && run.created_at >= dispatched_at
        })
        .max_by_key(|run| (run.created_at, run.id));

    Ok(match candidate {
        None => Tick::NoCandidate,
        Some(run) if run.status == RunStatus::Completed => Tick::Terminal(run),
        Some(run) => Tick::Running(run),
    })
}

fn transition(state: &mut MonitorState, next: MonitorState, events: &dyn EventSink) {
    if *state != next {
        *state = next;
        events.emit(PipelineEvent::Message(next.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HubError;
    use crate::types::Workflow;
    use airlift_core::NullSink;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fake Actions API driven by pre-scripted responses, one per poll
    struct ScriptedApi {
        workflows: Mutex<VecDeque<Vec<Workflow>>>,
        runs: Mutex<VecDeque<Result<Vec<WorkflowRun>>>>,
        run_polls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(
            workflows: Vec<Vec<Workflow>>,
            runs: Vec<Result<Vec<WorkflowRun>>>,
        ) -> Self {
            Self {
                workflows: Mutex::new(workflows.into_iter().collect()),
                runs: Mutex::new(runs.into_iter().collect()),
                run_polls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ActionsApi for ScriptedApi {
        async fn list_workflows(&self, _repo: &RepoRef) -> Result<Vec<Workflow>> {
            Ok(self
                .workflows
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }

        async fn list_dispatch_runs(
            &self,
            _repo: &RepoRef,
            _workflow_id: u64,
            _branch: &str,
        ) -> Result<Vec<WorkflowRun>> {
            self.run_polls.fetch_add(1, Ordering::SeqCst);
            self.runs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn repo() -> RepoRef {
        RepoRef::new("acme", "app")
    }

    fn build_workflow() -> Workflow {
        Workflow {
            id: 7,
            name: "Build".to_string(),
            path: ".github/workflows/build.yml".to_string(),
            state: "active".to_string(),
        }
    }

    fn run(id: u64, offset_secs: i64, status: RunStatus, conclusion: Option<RunConclusion>) -> WorkflowRun {
        WorkflowRun {
            id,
            status,
            conclusion,
            head_branch: "main".to_string(),
            event: "workflow_dispatch".to_string(),
            created_at: dispatch_time() + chrono::Duration::seconds(offset_secs),
        }
    }

    fn dispatch_time() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    fn budget() -> PollBudget {
        PollBudget::start(Duration::from_secs(2), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_succeeds_after_in_progress_polls() {
        let api = ScriptedApi::new(
            vec![vec![build_workflow()]],
            vec![
                Ok(vec![run(1, 0, RunStatus::Queued, None)]),
                Ok(vec![run(1, 0, RunStatus::InProgress, None)]),
                Ok(vec![run(1, 0, RunStatus::Completed, Some(RunConclusion::Success))]),
            ],
        );

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget(),
            &NullSink,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Succeeded(r) if r.id == 1));
        assert_eq!(api.run_polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_ignores_runs_created_before_dispatch() {
        let stale = run(5, -60, RunStatus::Completed, Some(RunConclusion::Success));
        let fresh = run(9, 1, RunStatus::Completed, Some(RunConclusion::Failure));
        let api = ScriptedApi::new(
            vec![vec![build_workflow()]],
            vec![
                Ok(vec![stale.clone()]),
                Ok(vec![stale, fresh]),
            ],
        );

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget(),
            &NullSink,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        // The stale success must never be mistaken for the dispatched run
        assert!(matches!(outcome, RunOutcome::Failed(r) if r.id == 9));
    }

    #[tokio::test]
    async fn test_newest_candidate_wins() {
        let older = run(3, 1, RunStatus::Completed, Some(RunConclusion::Success));
        let newer = run(4, 2, RunStatus::Completed, Some(RunConclusion::Cancelled));
        let api = ScriptedApi::new(
            vec![vec![build_workflow()]],
            vec![Ok(vec![older, newer])],
        );

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget(),
            &NullSink,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Cancelled(r) if r.id == 4));
    }

    #[tokio::test]
    async fn test_transient_error_costs_one_tick() {
        let api = ScriptedApi::new(
            vec![vec![build_workflow()]],
            vec![
                Err(HubError::RateLimited),
                Ok(vec![run(1, 0, RunStatus::Completed, Some(RunConclusion::Success))]),
            ],
        );

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget(),
            &NullSink,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Succeeded(_)));
        assert_eq!(api.run_polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts() {
        let api = ScriptedApi::new(
            vec![vec![build_workflow()]],
            vec![Err(HubError::AuthenticationFailed("bad token".to_string()))],
        );

        let result = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget(),
            &NullSink,
            &CancelFlag::new(),
        )
        .await;

        assert!(matches!(result, Err(HubError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_timeout_poll_count_is_bounded() {
        // 50ms budget at 30ms per tick allows at most ceil(50/30) + 1 = 3 polls
        let api = ScriptedApi::new(vec![vec![build_workflow()]], vec![]);
        let budget = PollBudget::start(Duration::from_millis(50), Duration::from_millis(30));

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget,
            &NullSink,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::TimedOut { .. }));
        assert!(api.run_polls.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_timeout_reports_last_state() {
        // Workflow never registers, so the monitor never leaves the first phase
        let api = ScriptedApi::new(vec![], vec![]);
        let budget = PollBudget::start(Duration::from_millis(20), Duration::from_millis(5));

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget,
            &NullSink,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        match outcome {
            RunOutcome::TimedOut { last_state } => {
                assert_eq!(last_state, "awaiting workflow registration")
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_checked_before_first_poll() {
        let api = ScriptedApi::new(vec![vec![build_workflow()]], vec![]);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget(),
            &NullSink,
            &cancel,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Interrupted));
        assert_eq!(api.run_polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_waits_for_registration_then_tracks() {
        let api = ScriptedApi::new(
            vec![vec![], vec![build_workflow()]],
            vec![Ok(vec![run(1, 0, RunStatus::Completed, Some(RunConclusion::Success))])],
        );

        let outcome = monitor_run(
            &api,
            &repo(),
            "build.yml",
            "main",
            dispatch_time(),
            budget(),
            &NullSink,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Succeeded(_)));
    }
}
