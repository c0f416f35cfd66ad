//! Adversarial critique of a finished report.

use crate::brain::{CompletionRequest, LlmProvider};
use crate::error::StageError;
use tracing::{debug, warn};

/// Text returned when the service produces no critique.
pub const FALLBACK_CRITIQUE: &str = "No challenges generated.";

const SYSTEM_PROMPT: &str = "You are a rigorous academic devil's advocate. Your job is to critically challenge research claims, identify weaknesses in methodology, question assumptions, and suggest improvements. Be constructive but thorough. Write in Markdown.";

pub fn build_prompt(topic: &str, report: &str) -> String {
    format!(
        "Topic: \"{topic}\"\n\nHere is the research report to challenge:\n\n{report}\n\nProvide:\n\
         1. **Methodological Concerns** - Issues with how claims are supported\n\
         2. **Alternative Interpretations** - Other ways to read the evidence\n\
         3. **Missing Perspectives** - Viewpoints or evidence not considered\n\
         4. **Suggested Revisions** - Specific improvements to strengthen the report"
    )
}

/// Run the critique stage.
pub async fn challenge_report(
    provider: &dyn LlmProvider,
    topic: &str,
    report: &str,
) -> Result<String, StageError> {
    let prompt = build_prompt(topic, report);
    debug!(topic, report_chars = report.len(), "Challenging report");

    let response = provider
        .complete(CompletionRequest::new(SYSTEM_PROMPT, prompt))
        .await?;

    Ok(match response.text() {
        Some(text) => text.to_string(),
        None => {
            warn!(topic, "Empty critique from completion service");
            FALLBACK_CRITIQUE.to_string()
        }
    })
}
