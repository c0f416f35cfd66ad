//! Per-run state machine.
//!
//! A [`RunState`] is created fresh for each run and moved along the linear
//! workflow by [`RunState::transition`]. Any failure goes straight back to
//! idle with every accumulated result discarded.

use super::confidence;
use crate::error::PipelineError;
use crate::types::{AnalysisResult, ConfidenceScores, Paper, WorkflowState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State and results of a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: Uuid,
    pub topic: String,
    pub state: WorkflowState,
    /// Every paper retrieved by the search stage, in catalog order.
    pub papers: Vec<Paper>,
    /// Papers sorted by relevance.
    pub ranked_papers: Vec<Paper>,
    pub analysis: Option<AnalysisResult>,
    pub report: Option<String>,
    pub critique: Option<String>,
    /// Message from the most recent failed run.
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new("")
    }
}

impl RunState {
    /// A fresh, idle run for `topic` with no results.
    pub fn new(topic: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            topic: topic.into(),
            state: WorkflowState::Idle,
            papers: Vec::new(),
            ranked_papers: Vec::new(),
            analysis: None,
            report: None,
            critique: None,
            last_error: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Advance to `to`, which must directly follow the current state.
    pub fn transition(&mut self, to: WorkflowState) -> Result<(), PipelineError> {
        if self.state.next() != Some(to) {
            return Err(PipelineError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Abort the run: drop all results, record the message, return to idle.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.papers.clear();
        self.ranked_papers.clear();
        self.analysis = None;
        self.report = None;
        self.critique = None;
        self.last_error = Some(message.into());
        self.state = WorkflowState::Idle;
        self.updated_at = Utc::now();
    }

    /// Stepper position in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        match self.state {
            WorkflowState::Idle => 0.0,
            WorkflowState::Searching => 0.2,
            WorkflowState::Ranking => 0.4,
            WorkflowState::Analyzing => 0.6,
            WorkflowState::Generating => 0.8,
            WorkflowState::Complete => 1.0,
        }
    }

    /// The first `n` ranked papers, or all of them when fewer exist.
    pub fn top_papers(&self, n: usize) -> &[Paper] {
        &self.ranked_papers[..n.min(self.ranked_papers.len())]
    }

    pub fn snapshot(&self, challenge_in_progress: bool) -> RunSnapshot {
        RunSnapshot {
            progress: self.progress(),
            run: self.clone(),
            challenge_in_progress,
        }
    }
}

/// Published view of a run, readable at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    #[serde(flatten)]
    pub run: RunState,
    pub progress: f64,
    pub challenge_in_progress: bool,
}

impl RunSnapshot {
    /// Confidence scores for this run, once an analysis exists.
    ///
    /// Scores the ranked papers when ranking produced any, else the retrieved set.
    pub fn confidence(&self) -> Option<ConfidenceScores> {
        let analysis = self.run.analysis.as_ref()?;
        let papers = if self.run.ranked_papers.is_empty() {
            &self.run.papers
        } else {
            &self.run.ranked_papers
        };
        Some(confidence::score(papers, analysis))
    }
}

/// Callback trait for progress reporting while a run executes.
pub trait PipelineCallback: Send + Sync {
    /// Called after every state change.
    fn on_state_change(&self, state: WorkflowState, progress: f64);
    /// Called when a stage finishes, with the number of items it produced.
    fn on_stage_complete(&self, stage: WorkflowState, items: usize);
    /// Called when a run fails.
    fn on_error(&self, message: &str);
}

/// No-op callback.
pub struct NoOpCallback;

impl PipelineCallback for NoOpCallback {
    fn on_state_change(&self, _state: WorkflowState, _progress: f64) {}
    fn on_stage_complete(&self, _stage: WorkflowState, _items: usize) {}
    fn on_error(&self, _message: &str) {}
}
