//! Pipeline orchestrator.
//!
//! Drives the stages strictly in sequence for one run at a time and
//! publishes a [`RunSnapshot`] that can be read while the run is in flight.
//! The critique action sits outside the linear workflow with its own busy
//! flag.

use super::session::{NoOpCallback, PipelineCallback, RunSnapshot, RunState};
use super::stages::PipelineStages;
use crate::error::{PipelineError, StageError};
use crate::types::{ConfidenceScores, WorkflowState};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Ranked papers handed to the analyzer and the report.
pub const ANALYSIS_TOP_N: usize = 5;

/// Name reported for failures of the critique action.
const CHALLENGE_STAGE: &str = "challenge";

/// Holds a busy flag for its lifetime.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs the literature-review workflow over a set of stages.
pub struct PipelineOrchestrator {
    stages: Arc<dyn PipelineStages>,
    run: Mutex<RunState>,
    running: AtomicBool,
    challenging: AtomicBool,
    callback: Arc<dyn PipelineCallback>,
}

impl PipelineOrchestrator {
    pub fn new(stages: Arc<dyn PipelineStages>) -> Self {
        Self {
            stages,
            run: Mutex::new(RunState::default()),
            running: AtomicBool::new(false),
            challenging: AtomicBool::new(false),
            callback: Arc::new(NoOpCallback),
        }
    }

    /// Attach a progress callback.
    pub fn with_callback(mut self, callback: Arc<dyn PipelineCallback>) -> Self {
        self.callback = callback;
        self
    }

    fn with_run<R>(&self, f: impl FnOnce(&mut RunState) -> R) -> R {
        let mut guard = self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Current published view of the run.
    pub fn snapshot(&self) -> RunSnapshot {
        let challenging = self.challenging.load(Ordering::Acquire);
        self.with_run(|run| run.snapshot(challenging))
    }

    pub fn state(&self) -> WorkflowState {
        self.with_run(|run| run.state)
    }

    /// Confidence scores for the current results, once an analysis exists.
    pub fn confidence(&self) -> Option<ConfidenceScores> {
        self.snapshot().confidence()
    }

    /// Execute a full run for `topic`.
    ///
    /// Prior results are discarded first. On any stage failure the run's
    /// results are discarded again, the state returns to idle and the stage
    /// error is returned.
    pub async fn run(&self, topic: &str) -> Result<RunSnapshot, PipelineError> {
        let _busy = BusyGuard::acquire(&self.running).ok_or(PipelineError::AlreadyRunning)?;

        let run_id = self.with_run(|run| {
            *run = RunState::new(topic);
            run.run_id
        });
        info!(run_id = %run_id, topic, "Starting literature review");

        self.advance(WorkflowState::Searching)?;
        let papers = self
            .stage(WorkflowState::Searching, self.stages.search(topic))
            .await?;
        self.with_run(|run| run.papers = papers.clone());
        self.callback
            .on_stage_complete(WorkflowState::Searching, papers.len());

        self.advance(WorkflowState::Ranking)?;
        let ranked = self
            .stage(WorkflowState::Ranking, self.stages.rank(topic, &papers))
            .await?;
        self.with_run(|run| run.ranked_papers = ranked.clone());
        self.callback
            .on_stage_complete(WorkflowState::Ranking, ranked.len());

        self.advance(WorkflowState::Analyzing)?;
        let top = ranked[..ANALYSIS_TOP_N.min(ranked.len())].to_vec();
        let analysis = self
            .stage(WorkflowState::Analyzing, self.stages.analyze(topic, &top))
            .await?;
        self.with_run(|run| run.analysis = Some(analysis.clone()));
        self.callback
            .on_stage_complete(WorkflowState::Analyzing, analysis.claims.len());

        self.advance(WorkflowState::Generating)?;
        let report = self
            .stage(
                WorkflowState::Generating,
                self.stages.generate_report(topic, &top, &analysis),
            )
            .await?;
        let report_len = report.len();
        self.with_run(|run| run.report = Some(report));
        self.callback
            .on_stage_complete(WorkflowState::Generating, report_len);

        self.advance(WorkflowState::Complete)?;
        info!(run_id = %run_id, topic, papers = papers.len(), "Literature review complete");
        Ok(self.snapshot())
    }

    /// Move the run to `to` and notify the callback.
    fn advance(&self, to: WorkflowState) -> Result<(), PipelineError> {
        let result = self.with_run(|run| {
            let result = run.transition(to);
            if let Err(e) = &result {
                run.fail(e.to_string());
            }
            result.map(|_| run.progress())
        });
        match result {
            Ok(progress) => {
                info!(state = %to, progress, "Pipeline state changed");
                self.callback.on_state_change(to, progress);
                Ok(())
            }
            Err(e) => {
                self.callback.on_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Await a stage, resetting the run to idle if it fails.
    async fn stage<T>(
        &self,
        stage: WorkflowState,
        fut: impl Future<Output = Result<T, StageError>>,
    ) -> Result<T, PipelineError> {
        match fut.await {
            Ok(value) => Ok(value),
            Err(source) => {
                let message = source.to_string();
                error!(stage = %stage, error = %message, "Pipeline stage failed");
                self.with_run(|run| run.fail(message.clone()));
                self.callback.on_error(&message);
                self.callback.on_state_change(WorkflowState::Idle, 0.0);
                Err(PipelineError::Stage {
                    stage: stage.to_string(),
                    source,
                })
            }
        }
    }

    /// Generate a critique of the current report.
    ///
    /// Does not touch the workflow state. The critique is only published if
    /// the report it challenges still belongs to the current run.
    pub async fn challenge(&self) -> Result<String, PipelineError> {
        let _busy =
            BusyGuard::acquire(&self.challenging).ok_or(PipelineError::ChallengeInProgress)?;

        let (run_id, topic, report): (Uuid, String, Option<String>) =
            self.with_run(|run| (run.run_id, run.topic.clone(), run.report.clone()));
        let report = report.ok_or(PipelineError::NoReport)?;

        match self.stages.challenge(&topic, &report).await {
            Ok(critique) => {
                let published = self.with_run(|run| {
                    if run.run_id == run_id {
                        run.critique = Some(critique.clone());
                        true
                    } else {
                        false
                    }
                });
                if !published {
                    warn!(run_id = %run_id, "Run changed during challenge, critique not published");
                }
                Ok(critique)
            }
            Err(source) => {
                error!(error = %source, "Challenge failed");
                self.callback.on_error(&source.to_string());
                Err(PipelineError::Stage {
                    stage: CHALLENGE_STAGE.to_string(),
                    source,
                })
            }
        }
    }
}
