//! Relevance ranking stage.
//!
//! The completion service scores every paper against the topic. Its output is
//! untrusted: the stated order is ignored, scores are clamped, and anything
//! that is not a JSON array degrades to a uniform default score.

use super::json::strip_code_fences;
use crate::brain::{CompletionRequest, LlmProvider};
use crate::error::StageError;
use crate::types::{Paper, RankingEntry};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Score given to papers the ranker did not (or could not) score.
pub const DEFAULT_RELEVANCE: f64 = 0.5;

const SYSTEM_PROMPT: &str = "You are an academic research relevance ranker. Given a research topic and a list of papers, score each paper's relevance from 0.0 to 1.0. Return ONLY valid JSON.";

/// Render the user prompt listing every paper with a truncated abstract.
pub fn build_prompt(topic: &str, papers: &[Paper], preview_chars: usize) -> String {
    let list = papers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let preview: String = p.abstract_text.chars().take(preview_chars).collect();
            format!("[{}] \"{}\" ({}) - {}...", i + 1, p.title, p.year, preview)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Topic: \"{topic}\"\n\nPapers:\n{list}\n\nReturn a JSON array of objects with \"index\" (1-based) and \"score\" (0.0-1.0) and \"reason\" (one sentence). Sort by score descending. Example: [{{\"index\":1,\"score\":0.95,\"reason\":\"Directly addresses the topic\"}}]"
    )
}

/// Parse raw completion text into ranking entries.
///
/// Returns `None` unless the text (after fence stripping) is a JSON array.
/// Array elements without a positive integer `index` or a numeric `score`
/// are dropped; the papers they would have matched get the default score.
pub fn parse_rankings(raw: &str) -> Option<Vec<RankingEntry>> {
    let value: Value = serde_json::from_str(&strip_code_fences(raw)).ok()?;
    let items = value.as_array()?;

    let entries = items
        .iter()
        .filter_map(|item| {
            let index = item.get("index").and_then(as_index)?;
            let score = item.get("score").and_then(Value::as_f64)?;
            let reason = item
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(RankingEntry {
                index,
                score: clamp_score(score),
                reason,
            })
        })
        .collect();
    Some(entries)
}

fn as_index(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok().filter(|n| *n > 0);
    }
    // Some models emit 3.0 instead of 3.
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f >= 1.0).then_some(f as usize)
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        DEFAULT_RELEVANCE
    }
}

/// Attach scores to papers and sort descending.
///
/// The paper at 1-based position `i` takes the score of the first entry with
/// `index == i`, or [`DEFAULT_RELEVANCE`] when none matches. With no rankings
/// at all every paper gets the default. The sort is stable, so ties keep
/// input order.
pub fn apply_rankings(papers: &[Paper], rankings: Option<&[RankingEntry]>) -> Vec<Paper> {
    let mut ranked: Vec<Paper> = papers
        .iter()
        .enumerate()
        .map(|(i, paper)| {
            let score = rankings
                .and_then(|entries| entries.iter().find(|e| e.index == i + 1))
                .map(|e| e.score)
                .unwrap_or(DEFAULT_RELEVANCE);
            paper.with_relevance(score)
        })
        .collect();

    ranked.sort_by(|a, b| {
        let a = a.relevance_score.unwrap_or(DEFAULT_RELEVANCE);
        let b = b.relevance_score.unwrap_or(DEFAULT_RELEVANCE);
        b.total_cmp(&a)
    });
    ranked
}

/// Run the ranking stage.
pub async fn rank_papers(
    provider: &dyn LlmProvider,
    topic: &str,
    papers: &[Paper],
    preview_chars: usize,
) -> Result<Vec<Paper>, StageError> {
    if papers.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_prompt(topic, papers, preview_chars);
    debug!(topic, papers = papers.len(), prompt_chars = prompt.len(), "Ranking papers");

    let response = provider
        .complete(CompletionRequest::new(SYSTEM_PROMPT, prompt))
        .await?;

    let rankings = response.text().and_then(parse_rankings);
    if rankings.is_none() {
        warn!(topic, "Ranking output unusable, assigning default scores");
    }

    let ranked = apply_rankings(papers, rankings.as_deref());
    info!(topic, papers = ranked.len(), "Ranking complete");
    Ok(ranked)
}
