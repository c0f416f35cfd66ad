//! The five pipeline stages behind a single call pattern.

use super::{analyzer, critique, ranker, report, search};
use super::search::PaperSource;
use crate::brain::LlmProvider;
use crate::config::{LlmConfig, PipelineConfig};
use crate::error::StageError;
use crate::providers::create_provider;
use crate::types::{AnalysisResult, Paper};
use async_trait::async_trait;
use std::sync::Arc;

/// A uniform request/response interface to every stage.
///
/// Every failure surfaces as a [`StageError`]; unparseable model output is
/// not a failure and is handled inside the stage.
#[async_trait]
pub trait PipelineStages: Send + Sync {
    async fn search(&self, topic: &str) -> Result<Vec<Paper>, StageError>;

    async fn rank(&self, topic: &str, papers: &[Paper]) -> Result<Vec<Paper>, StageError>;

    async fn analyze(&self, topic: &str, papers: &[Paper]) -> Result<AnalysisResult, StageError>;

    async fn generate_report(
        &self,
        topic: &str,
        papers: &[Paper],
        analysis: &AnalysisResult,
    ) -> Result<String, StageError>;

    async fn challenge(&self, topic: &str, report: &str) -> Result<String, StageError>;
}

enum ProviderSlot {
    Fixed(Arc<dyn LlmProvider>),
    FromConfig(LlmConfig),
}

/// Stages executed in-process.
pub struct LocalStages {
    first: Arc<dyn PaperSource>,
    second: Arc<dyn PaperSource>,
    provider: ProviderSlot,
    pipeline: PipelineConfig,
}

impl LocalStages {
    /// Build stages whose completion provider is created from `llm` on each
    /// call, so a missing credential only fails the stages that need it.
    pub fn new(
        first: Arc<dyn PaperSource>,
        second: Arc<dyn PaperSource>,
        llm: LlmConfig,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            first,
            second,
            provider: ProviderSlot::FromConfig(llm),
            pipeline,
        }
    }

    /// Build stages around an existing provider.
    pub fn with_provider(
        first: Arc<dyn PaperSource>,
        second: Arc<dyn PaperSource>,
        provider: Arc<dyn LlmProvider>,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            first,
            second,
            provider: ProviderSlot::Fixed(provider),
            pipeline,
        }
    }

    fn provider(&self) -> Result<Arc<dyn LlmProvider>, StageError> {
        match &self.provider {
            ProviderSlot::Fixed(provider) => Ok(Arc::clone(provider)),
            ProviderSlot::FromConfig(config) => Ok(create_provider(config)?),
        }
    }
}

#[async_trait]
impl PipelineStages for LocalStages {
    async fn search(&self, topic: &str) -> Result<Vec<Paper>, StageError> {
        search::search_papers(self.first.as_ref(), self.second.as_ref(), topic).await
    }

    async fn rank(&self, topic: &str, papers: &[Paper]) -> Result<Vec<Paper>, StageError> {
        let provider = self.provider()?;
        ranker::rank_papers(
            provider.as_ref(),
            topic,
            papers,
            self.pipeline.abstract_preview_chars,
        )
        .await
    }

    async fn analyze(&self, topic: &str, papers: &[Paper]) -> Result<AnalysisResult, StageError> {
        let provider = self.provider()?;
        analyzer::analyze_papers(provider.as_ref(), topic, papers).await
    }

    async fn generate_report(
        &self,
        topic: &str,
        papers: &[Paper],
        analysis: &AnalysisResult,
    ) -> Result<String, StageError> {
        let provider = self.provider()?;
        report::generate_report(
            provider.as_ref(),
            topic,
            papers,
            analysis,
            self.pipeline.report_claim_limit,
        )
        .await
    }

    async fn challenge(&self, topic: &str, report: &str) -> Result<String, StageError> {
        let provider = self.provider()?;
        critique::challenge_report(provider.as_ref(), topic, report).await
    }
}
