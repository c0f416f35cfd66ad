//! Search stage: query both catalogs concurrently and merge the results.

use super::aggregator::aggregate;
use crate::error::{SourceError, StageError};
use crate::types::Paper;
use async_trait::async_trait;
use tracing::{debug, info};

/// Message returned when a search is attempted without a topic.
pub const TOPIC_REQUIRED: &str = "Topic is required";

/// An external paper catalog.
///
/// Implementations skip or fill malformed individual records, but return an
/// error when the catalog itself is unreachable or answers with a
/// non-success status.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Human-readable catalog name used in logs and errors.
    fn name(&self) -> &str;

    /// Search the catalog for papers on `topic`.
    async fn search(&self, topic: &str) -> Result<Vec<Paper>, SourceError>;
}

/// Reject blank topics before any network call is made.
pub fn validate_topic(topic: &str) -> Result<&str, StageError> {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        return Err(StageError::InvalidRequest {
            message: TOPIC_REQUIRED.to_string(),
        });
    }
    Ok(trimmed)
}

/// Build a YouTube search link for a paper title.
///
/// Pure templating; the link is neither fetched nor validated.
pub fn youtube_search_url(title: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(title)
    )
}

/// Attach a YouTube search link to every paper.
pub fn attach_youtube_links(papers: Vec<Paper>) -> Vec<Paper> {
    papers
        .into_iter()
        .map(|mut paper| {
            paper.youtube_url = Some(youtube_search_url(&paper.title));
            paper
        })
        .collect()
}

/// Run the search stage against two catalogs.
///
/// Both fetches are issued together and joined; if either fails the stage
/// fails. Results are concatenated `first` then `second`.
pub async fn search_papers(
    first: &dyn PaperSource,
    second: &dyn PaperSource,
    topic: &str,
) -> Result<Vec<Paper>, StageError> {
    let topic = validate_topic(topic)?;
    debug!(topic, first = first.name(), second = second.name(), "Searching catalogs");

    let (a, b) = futures::try_join!(first.search(topic), second.search(topic))?;
    info!(
        topic,
        first_count = a.len(),
        second_count = b.len(),
        "Catalog searches complete"
    );

    Ok(attach_youtube_links(aggregate(a, b)))
}

/// A catalog that returns a fixed result. Useful for tests and offline demos.
pub struct FixedPaperSource {
    name: String,
    outcome: Result<Vec<Paper>, u16>,
}

impl FixedPaperSource {
    /// A catalog that always returns `papers`.
    pub fn new(name: impl Into<String>, papers: Vec<Paper>) -> Self {
        Self {
            name: name.into(),
            outcome: Ok(papers),
        }
    }

    /// A catalog that always answers with the given HTTP status.
    pub fn failing(name: impl Into<String>, status: u16) -> Self {
        Self {
            name: name.into(),
            outcome: Err(status),
        }
    }
}

#[async_trait]
impl PaperSource for FixedPaperSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _topic: &str) -> Result<Vec<Paper>, SourceError> {
        match &self.outcome {
            Ok(papers) => Ok(papers.clone()),
            Err(status) => Err(SourceError::Status {
                source_name: self.name.clone(),
                status: *status,
                body: "unavailable".to_string(),
            }),
        }
    }
}
