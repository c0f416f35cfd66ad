//! # litreview sources
//!
//! Paper catalog adapters for litreview. Each adapter implements the core
//! [`PaperSource`] trait and normalizes catalog records into [`Paper`]s.
//!
//! [`Paper`]: litreview_core::Paper

pub mod arxiv;
pub mod semantic_scholar;

pub use arxiv::ArxivClient;
pub use semantic_scholar::SemanticScholarClient;

use litreview_core::pipeline::PaperSource;
use litreview_core::{SourceError, SourcesConfig};
use std::sync::Arc;
use std::time::Duration;

/// Build the shared HTTP client settings for a catalog adapter.
pub(crate) fn build_client(config: &SourcesConfig) -> Result<reqwest::Client, SourceError> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| SourceError::Client {
        message: e.to_string(),
    })
}

/// The default catalog pair, arXiv first and Semantic Scholar second.
pub fn default_sources(
    config: &SourcesConfig,
) -> Result<(Arc<dyn PaperSource>, Arc<dyn PaperSource>), SourceError> {
    let arxiv: Arc<dyn PaperSource> = Arc::new(ArxivClient::new(config)?);
    let scholar: Arc<dyn PaperSource> = Arc::new(SemanticScholarClient::new(config)?);
    Ok((arxiv, scholar))
}
