//! # litreview core
//!
//! Core library for the litreview literature-review pipeline.
//! Provides the data model, completion-service interface, the pipeline
//! stages and their orchestrator, configuration, and the HTTP stage gateway.

pub mod brain;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod providers;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{CompletionRequest, CompletionResponse, LlmProvider, MockLlmProvider};
pub use config::{LitReviewConfig, LlmConfig, PipelineConfig, SourcesConfig, load_config};
pub use error::{
    ConfigError, LitReviewError, LlmError, PipelineError, Result, SourceError, StageError,
};
pub use gateway::GatewayConfig;
pub use pipeline::{
    ConfidenceBand, LocalStages, PaperSource, PipelineCallback, PipelineOrchestrator,
    PipelineStages, RemoteStages, RunSnapshot, RunState,
};
pub use types::{
    AnalysisResult, Catalog, Claim, ConfidenceScores, Contradiction, Paper, RankingEntry,
    WorkflowState,
};
