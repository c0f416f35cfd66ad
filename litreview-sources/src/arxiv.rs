//! arXiv catalog adapter.
//!
//! Queries the arXiv export API and tag-scans the Atom response. No XML
//! parser is involved: each `<entry>` block is sliced out and the handful of
//! fields we need are extracted by tag.

use crate::build_client;
use async_trait::async_trait;
use litreview_core::pipeline::PaperSource;
use litreview_core::{Catalog, Paper, SourceError, SourcesConfig};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, error, info};

const SOURCE_NAME: &str = "arXiv";

static AUTHOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<author>\s*<name>([^<]+)</name>").unwrap());

/// HTTP client for the arXiv query API.
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl ArxivClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.arxiv_base_url.clone(),
            max_results: config.max_results,
        })
    }

    /// Build the relevance-sorted query URL for `topic`.
    pub fn search_url(&self, topic: &str) -> String {
        format!(
            "{}?search_query=all:{}&start=0&max_results={}&sortBy=relevance",
            self.base_url,
            urlencoding::encode(topic),
            self.max_results
        )
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, topic: &str) -> Result<Vec<Paper>, SourceError> {
        let url = self.search_url(topic);
        debug!(url = %url, "arXiv search URL");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                source_name: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SourceError::Request {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "arXiv API error");
            return Err(SourceError::Status {
                source_name: SOURCE_NAME.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let papers = parse_atom_feed(&body);
        info!(topic, papers = papers.len(), "arXiv search complete");
        Ok(papers)
    }
}

// ── Atom parsing ──────────────────────────────────────────────

/// Parse every `<entry>` block of an Atom feed into a paper.
///
/// Produces exactly one paper per block, each with a fresh id. Missing
/// fields get placeholders rather than dropping the record.
pub fn parse_atom_feed(xml: &str) -> Vec<Paper> {
    xml.split("<entry>").skip(1).map(parse_entry).collect()
}

fn parse_entry(entry: &str) -> Paper {
    let title = extract_tag_text(entry, "title")
        .map(|t| flatten_lines(&t))
        .unwrap_or_default();
    let mut paper = Paper::new(title, Catalog::Arxiv);

    paper.abstract_text = extract_tag_text(entry, "summary")
        .map(|s| flatten_lines(&s))
        .unwrap_or_default();
    paper.year = extract_tag_text(entry, "published")
        .map(|d| extract_year(&d))
        .unwrap_or(0);
    paper.authors = AUTHOR_NAME
        .captures_iter(entry)
        .map(|c| c[1].trim().to_string())
        .collect();
    paper.url = extract_tag_text(entry, "id")
        .map(|id| id.trim().to_string())
        .unwrap_or_default();
    paper
}

/// Text content of the first `<tag ...>text</tag>` occurrence, untrimmed.
fn extract_tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut search_from = 0;
    loop {
        let start_pos = search_from + xml[search_from..].find(&open)?;
        let after_name = start_pos + open.len();
        // Skip longer tag names sharing the prefix, e.g. <identifier> for <id>.
        match xml[after_name..].chars().next() {
            Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | Some('/') => {}
            _ => {
                search_from = after_name;
                continue;
            }
        }
        let content_start = xml[start_pos..].find('>')? + start_pos + 1;
        let content_end = xml[content_start..].find(&close)? + content_start;
        return Some(xml[content_start..content_end].to_string());
    }
}

/// Replace line breaks with spaces and trim.
fn flatten_lines(s: &str) -> String {
    s.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}

/// Calendar year from an ISO-like date such as `2017-06-12T17:57:34Z`.
fn extract_year(date: &str) -> i32 {
    date.trim()
        .split('-')
        .next()
        .and_then(|y| y.parse().ok())
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_core::types::UNTITLED;
    use pretty_assertions::assert_eq;

    const SAMPLE_ENTRY: &str = r#"<entry>
    <id>http://arxiv.org/abs/1609.02907v4</id>
    <updated>2017-02-22T09:55:36Z</updated>
    <published>2016-09-09T19:48:14Z</published>
    <title>Semi-Supervised Classification with Graph
  Convolutional Networks</title>
    <summary>  We present a scalable approach for semi-supervised learning on
graph-structured data.  </summary>
    <author>
      <name>Thomas N. Kipf</name>
    </author>
    <author><name>Max Welling</name></author>
    <link href="http://arxiv.org/pdf/1609.02907v4" title="pdf" type="application/pdf"/>
</entry>"#;

    #[test]
    fn test_parse_single_entry() {
        let feed = format!("<feed><title>ArXiv Query</title>{}</feed>", SAMPLE_ENTRY);
        let papers = parse_atom_feed(&feed);
        assert_eq!(papers.len(), 1);

        let paper = &papers[0];
        assert_eq!(
            paper.title,
            "Semi-Supervised Classification with Graph   Convolutional Networks"
        );
        assert_eq!(
            paper.abstract_text,
            "We present a scalable approach for semi-supervised learning on graph-structured data."
        );
        assert_eq!(paper.year, 2016);
        assert_eq!(paper.authors, vec!["Thomas N. Kipf", "Max Welling"]);
        assert_eq!(paper.url, "http://arxiv.org/abs/1609.02907v4");
        assert_eq!(paper.source, Catalog::Arxiv);
    }

    #[test]
    fn test_feed_title_is_not_a_paper_title() {
        let feed = format!("<feed><title>ArXiv Query</title>{}</feed>", SAMPLE_ENTRY);
        assert!(!parse_atom_feed(&feed)[0].title.contains("ArXiv Query"));
    }

    #[test]
    fn test_missing_fields_get_placeholders() {
        let papers = parse_atom_feed("<feed><entry><id>http://arxiv.org/abs/x</id></entry></feed>");
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, UNTITLED);
        assert_eq!(papers[0].year, 0);
        assert!(papers[0].authors.is_empty());
        assert_eq!(papers[0].abstract_text, "");
    }

    #[test]
    fn test_each_entry_gets_unique_id() {
        let feed = format!("<feed>{SAMPLE_ENTRY}{SAMPLE_ENTRY}{SAMPLE_ENTRY}</feed>");
        let papers = parse_atom_feed(&feed);
        assert_eq!(papers.len(), 3);
        assert_ne!(papers[0].id, papers[1].id);
        assert_ne!(papers[1].id, papers[2].id);
        assert!(uuid::Uuid::parse_str(&papers[0].id).is_ok());
    }

    #[test]
    fn test_empty_feed() {
        assert!(parse_atom_feed("<feed><title>ArXiv Query</title></feed>").is_empty());
    }

    #[test]
    fn test_extract_tag_skips_longer_names() {
        let xml = "<identifier>nope</identifier><id>yes</id>";
        assert_eq!(extract_tag_text(xml, "id").as_deref(), Some("yes"));
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("2017-06-12T17:57:34Z"), 2017);
        assert_eq!(extract_year("garbage"), 0);
    }

    #[test]
    fn test_search_url() {
        let client = ArxivClient::new(&SourcesConfig::default()).unwrap();
        assert_eq!(
            client.search_url("graph neural networks"),
            "http://export.arxiv.org/api/query?search_query=all:graph%20neural%20networks&start=0&max_results=10&sortBy=relevance"
        );
    }
}
