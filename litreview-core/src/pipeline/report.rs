//! Report synthesis stage. Output is free-form Markdown and is not validated.

use crate::brain::{CompletionRequest, LlmProvider};
use crate::error::StageError;
use crate::types::{AnalysisResult, Paper};
use tracing::{debug, info, warn};

/// Document returned when the service produces no report text.
pub const FALLBACK_REPORT: &str = "# Report\n\nCould not generate report.";

/// Section headings the report is asked to contain, in order.
pub const REPORT_SECTIONS: [&str; 6] = [
    "Executive Summary",
    "Key Findings",
    "Contradictions",
    "Research Gaps",
    "Confidence Scores",
    "References",
];

const SYSTEM_PROMPT: &str = "You are an expert academic report writer. Generate a comprehensive, well-structured research report in Markdown format.";

pub fn build_prompt(
    topic: &str,
    papers: &[Paper],
    analysis: &AnalysisResult,
    claim_limit: usize,
) -> String {
    let citations = papers
        .iter()
        .map(|p| {
            let authors: Vec<&str> = p.authors.iter().take(3).map(String::as_str).collect();
            format!("- \"{}\" ({}) by {}", p.title, p.year, authors.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let claims: Vec<_> = analysis.claims.iter().take(claim_limit).collect();
    let sections = REPORT_SECTIONS
        .iter()
        .map(|s| format!("# {s}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate a research report on: \"{topic}\"\n\n\
         Based on analysis of {count} papers:\n{citations}\n\n\
         Analysis findings:\n\
         - Summary: {summary}\n\
         - {claim_count} key claims identified\n\
         - {contradiction_count} contradictions found\n\
         - {gap_count} research gaps identified\n\n\
         Claims: {claims}\n\
         Contradictions: {contradictions}\n\
         Gaps: {gaps}\n\n\
         Write the report with these sections:\n{sections}\n\n\
         Use proper academic citations. Include confidence percentages for claims.",
        count = papers.len(),
        summary = analysis.summary,
        claim_count = analysis.claims.len(),
        contradiction_count = analysis.contradictions.len(),
        gap_count = analysis.gaps.len(),
        claims = to_json(&claims),
        contradictions = to_json(&analysis.contradictions),
        gaps = to_json(&analysis.gaps),
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Run the report stage.
pub async fn generate_report(
    provider: &dyn LlmProvider,
    topic: &str,
    papers: &[Paper],
    analysis: &AnalysisResult,
    claim_limit: usize,
) -> Result<String, StageError> {
    let prompt = build_prompt(topic, papers, analysis, claim_limit);
    debug!(topic, papers = papers.len(), prompt_chars = prompt.len(), "Generating report");

    let response = provider
        .complete(CompletionRequest::new(SYSTEM_PROMPT, prompt))
        .await?;

    let report = match response.text() {
        Some(text) => text.to_string(),
        None => {
            warn!(topic, "Empty report from completion service, using placeholder");
            FALLBACK_REPORT.to_string()
        }
    };
    info!(topic, chars = report.len(), "Report generated");
    Ok(report)
}
