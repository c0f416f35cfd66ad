//! Core type definitions for litreview.
//!
//! Defines the data shapes that flow between pipeline stages: papers,
//! ranking entries, the structured analysis, confidence scores and the
//! workflow state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title used when a catalog record has none.
pub const UNTITLED: &str = "Untitled";

/// The external catalog a paper was retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Catalog {
    Arxiv,
    SemanticScholar,
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Catalog::Arxiv => write!(f, "arxiv"),
            Catalog::SemanticScholar => write!(f, "semantic_scholar"),
        }
    }
}

/// A paper record normalized from one of the catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publication year; `0` means unknown.
    #[serde(default)]
    pub year: i32,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub url: String,
    pub source: Catalog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

impl Paper {
    /// Create a paper with a freshly generated id and empty optional fields.
    pub fn new(title: impl Into<String>, source: Catalog) -> Self {
        let title = title.into();
        Self {
            id: Uuid::new_v4().to_string(),
            title: if title.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                title
            },
            authors: Vec::new(),
            year: 0,
            abstract_text: String::new(),
            url: String::new(),
            source,
            relevance_score: None,
            youtube_url: None,
        }
    }

    /// Whether the publication year is known.
    pub fn has_year(&self) -> bool {
        self.year != 0
    }

    /// Return a copy of this paper carrying the given relevance score.
    pub fn with_relevance(&self, score: f64) -> Self {
        Self {
            relevance_score: Some(score),
            ..self.clone()
        }
    }
}

/// One scored entry in the ranker's raw output. Indices are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub index: usize,
    pub score: f64,
    #[serde(default)]
    pub reason: String,
}

/// A claim extracted from the analyzed papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    pub confidence: f64,
    #[serde(default)]
    pub supporting_papers: Vec<String>,
}

/// A disagreement between two or more papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub description: String,
    #[serde(default)]
    pub papers: Vec<String>,
}

/// Structured analysis of the top-ranked papers.
///
/// Every field is always present; lists are empty rather than absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub contradictions: Vec<Contradiction>,
    #[serde(default)]
    pub gaps: Vec<String>,
}

/// Summary substituted when the analysis cannot be parsed.
pub const UNPARSEABLE_ANALYSIS_SUMMARY: &str = "Analysis could not be parsed.";

impl AnalysisResult {
    /// The deterministic value used when the completion output is unusable.
    pub fn fallback() -> Self {
        Self {
            summary: UNPARSEABLE_ANALYSIS_SUMMARY.to_string(),
            claims: Vec::new(),
            contradictions: Vec::new(),
            gaps: Vec::new(),
        }
    }
}

/// Confidence scores, each an integer percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub recency: u8,
    pub relevance: u8,
    pub agreement: u8,
    pub overall: u8,
}

/// Position of a run in the linear workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    #[default]
    Idle,
    Searching,
    Ranking,
    Analyzing,
    Generating,
    Complete,
}

impl WorkflowState {
    /// The state that follows this one on the happy path, if any.
    pub fn next(self) -> Option<WorkflowState> {
        match self {
            WorkflowState::Idle => Some(WorkflowState::Searching),
            WorkflowState::Searching => Some(WorkflowState::Ranking),
            WorkflowState::Ranking => Some(WorkflowState::Analyzing),
            WorkflowState::Analyzing => Some(WorkflowState::Generating),
            WorkflowState::Generating => Some(WorkflowState::Complete),
            WorkflowState::Complete => None,
        }
    }

    /// Whether a stage is currently executing.
    pub fn is_running(self) -> bool {
        !matches!(self, WorkflowState::Idle | WorkflowState::Complete)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "idle"),
            WorkflowState::Searching => write!(f, "searching"),
            WorkflowState::Ranking => write!(f, "ranking"),
            WorkflowState::Analyzing => write!(f, "analyzing"),
            WorkflowState::Generating => write!(f, "generating"),
            WorkflowState::Complete => write!(f, "complete"),
        }
    }
}
