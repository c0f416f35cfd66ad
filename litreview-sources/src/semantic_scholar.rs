//! Semantic Scholar catalog adapter.
//!
//! Uses the graph API paper search. Individual hits are normalized leniently;
//! only transport failures and non-success statuses are errors.

use crate::build_client;
use async_trait::async_trait;
use litreview_core::pipeline::PaperSource;
use litreview_core::{Catalog, Paper, SourceError, SourcesConfig};
use serde_json::Value;
use tracing::{debug, error, info, warn};

const SOURCE_NAME: &str = "Semantic Scholar";
const SEARCH_FIELDS: &str = "title,authors,year,abstract,url,externalIds";

/// HTTP client for the Semantic Scholar graph API.
pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    /// Create a client. The API key is read from the configured environment
    /// variable, when one is named and set.
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let api_key = config
            .semantic_scholar_api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.trim().is_empty());
        Ok(Self {
            client: build_client(config)?,
            base_url: config
                .semantic_scholar_base_url
                .trim_end_matches('/')
                .to_string(),
            max_results: config.max_results,
            api_key,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn search_url(&self, topic: &str) -> String {
        format!(
            "{}/paper/search?query={}&limit={}&fields={}",
            self.base_url,
            urlencoding::encode(topic),
            self.max_results,
            SEARCH_FIELDS
        )
    }
}

#[async_trait]
impl PaperSource for SemanticScholarClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, topic: &str) -> Result<Vec<Paper>, SourceError> {
        let url = self.search_url(topic);
        debug!(url = %url, authenticated = self.api_key.is_some(), "Semantic Scholar search URL");

        let mut request = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| SourceError::Request {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SourceError::Request {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Semantic Scholar API error");
            return Err(SourceError::Status {
                source_name: SOURCE_NAME.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| SourceError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let papers = parse_search_response(&json);
        info!(topic, papers = papers.len(), "Semantic Scholar search complete");
        Ok(papers)
    }
}

/// Normalize a search response body into papers.
///
/// A body without a `data` array yields no papers. Hits that are not JSON
/// objects are skipped.
pub fn parse_search_response(body: &Value) -> Vec<Paper> {
    let Some(hits) = body.get("data").and_then(|v| v.as_array()) else {
        warn!("Semantic Scholar response has no data array");
        return Vec::new();
    };

    hits.iter()
        .filter(|hit| hit.is_object())
        .map(parse_hit)
        .collect()
}

fn parse_hit(hit: &Value) -> Paper {
    let str_field = |key: &str| hit.get(key).and_then(|v| v.as_str()).unwrap_or_default();

    let mut paper = Paper::new(str_field("title"), Catalog::SemanticScholar);
    if let Some(id) = hit
        .get("paperId")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
    {
        paper.id = id.to_string();
    }

    paper.authors = hit
        .get("authors")
        .and_then(|v| v.as_array())
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| a.get("name").and_then(|n| n.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    paper.year = hit
        .get("year")
        .and_then(|v| v.as_i64())
        .and_then(|y| i32::try_from(y).ok())
        .unwrap_or(0);
    paper.abstract_text = str_field("abstract").to_string();

    let url = str_field("url");
    paper.url = if !url.is_empty() {
        url.to_string()
    } else {
        hit.get("externalIds")
            .and_then(|ids| ids.get("ArXiv"))
            .and_then(|v| v.as_str())
            .map(|arxiv_id| format!("https://arxiv.org/abs/{}", arxiv_id))
            .unwrap_or_default()
    };
    paper
}
