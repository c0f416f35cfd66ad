//! The literature-review pipeline.
//!
//! Stages, leaves first:
//!
//! 1. **search** ([`search`], [`aggregator`]): query two catalogs and merge.
//! 2. **rank** ([`ranker`]): score relevance via the completion service.
//! 3. **analyze** ([`analyzer`]): extract claims, contradictions and gaps.
//! 4. **generate-report** ([`report`]): synthesize a Markdown report.
//! 5. **challenge** ([`critique`]): critique a finished report.
//!
//! [`confidence`] scores the results without any network calls, and
//! [`engine::PipelineOrchestrator`] drives a run through [`stages::PipelineStages`].

pub mod aggregator;
pub mod analyzer;
pub mod confidence;
pub mod critique;
pub mod engine;
pub mod json;
pub mod ranker;
pub mod remote;
pub mod report;
pub mod search;
pub mod session;
pub mod stages;

pub use aggregator::aggregate;
pub use confidence::{ConfidenceBand, score, score_at};
pub use engine::{ANALYSIS_TOP_N, PipelineOrchestrator};
pub use remote::RemoteStages;
pub use search::{FixedPaperSource, PaperSource, search_papers, youtube_search_url};
pub use session::{NoOpCallback, PipelineCallback, RunSnapshot, RunState};
pub use stages::{LocalStages, PipelineStages};
