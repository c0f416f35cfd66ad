//! Claim extraction stage.

use super::json::strip_code_fences;
use crate::brain::{CompletionRequest, LlmProvider};
use crate::error::StageError;
use crate::types::{AnalysisResult, Paper};
use serde_json::Value;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are an expert research analyst. Analyze the given papers on the topic and extract: key claims with confidence scores, contradictions between papers, and research gaps. Return ONLY valid JSON.";

const RESPONSE_SHAPE: &str = r#"Return JSON with this exact structure:
{
  "summary": "2-3 sentence summary of the overall findings",
  "claims": [{"text": "claim text", "confidence": 0.0-1.0, "supporting_papers": ["Paper 1 title"]}],
  "contradictions": [{"description": "what contradicts", "papers": ["Paper 1 title", "Paper 2 title"]}],
  "gaps": ["gap description 1", "gap description 2"]
}"#;

pub fn build_prompt(topic: &str, papers: &[Paper]) -> String {
    let details = papers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "Paper {}: \"{}\" ({})\nAuthors: {}\nAbstract: {}",
                i + 1,
                p.title,
                p.year,
                p.authors.join(", "),
                p.abstract_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!("Topic: \"{topic}\"\n\n{details}\n\n{RESPONSE_SHAPE}")
}

/// Parse raw completion text into an analysis.
///
/// All or nothing: the text must be a JSON object whose claims carry `text`
/// and a numeric `confidence` and whose contradictions carry a
/// `description`. Absent list fields become empty lists. Claim confidences
/// are clamped to `[0, 1]`.
pub fn parse_analysis(raw: &str) -> Option<AnalysisResult> {
    let value: Value = serde_json::from_str(&strip_code_fences(raw)).ok()?;
    if !value.is_object() {
        return None;
    }
    let mut analysis: AnalysisResult = serde_json::from_value(value).ok()?;
    for claim in &mut analysis.claims {
        claim.confidence = claim.confidence.clamp(0.0, 1.0);
    }
    Some(analysis)
}

/// Run the analysis stage over the given (already capped) papers.
pub async fn analyze_papers(
    provider: &dyn LlmProvider,
    topic: &str,
    papers: &[Paper],
) -> Result<AnalysisResult, StageError> {
    let prompt = build_prompt(topic, papers);
    debug!(topic, papers = papers.len(), prompt_chars = prompt.len(), "Analyzing papers");

    let response = provider
        .complete(CompletionRequest::new(SYSTEM_PROMPT, prompt))
        .await?;

    let analysis = match response.text().and_then(parse_analysis) {
        Some(analysis) => analysis,
        None => {
            warn!(topic, "Analysis output unusable, substituting default");
            AnalysisResult::fallback()
        }
    };

    info!(
        topic,
        claims = analysis.claims.len(),
        contradictions = analysis.contradictions.len(),
        gaps = analysis.gaps.len(),
        "Analysis complete"
    );
    Ok(analysis)
}
