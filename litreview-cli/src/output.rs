//! Terminal rendering for pipeline progress and results.

use litreview_core::{
    ConfidenceBand, ConfidenceScores, Paper, PipelineCallback, RunSnapshot, WorkflowState,
};
use std::fmt::Write;

/// Prints state transitions to stderr as the run advances.
pub struct ConsoleCallback {
    quiet: bool,
}

impl ConsoleCallback {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl PipelineCallback for ConsoleCallback {
    fn on_state_change(&self, state: WorkflowState, progress: f64) {
        if !self.quiet {
            eprintln!("{}", state_line(state, progress));
        }
    }

    fn on_stage_complete(&self, stage: WorkflowState, items: usize) {
        if !self.quiet {
            eprintln!("       {} done ({} items)", stage, items);
        }
    }

    fn on_error(&self, message: &str) {
        eprintln!("  Error: {}", message);
    }
}

pub fn state_line(state: WorkflowState, progress: f64) -> String {
    format!("[{:>3}%] {}", (progress * 100.0).round() as u32, state)
}

fn paper_line(rank: usize, paper: &Paper) -> String {
    let year = if paper.has_year() {
        paper.year.to_string()
    } else {
        "n.d.".to_string()
    };
    let score = paper
        .relevance_score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>2}. [{}] {} ({}, {})",
        rank, score, paper.title, year, paper.source
    )
}

fn confidence_block(scores: &ConfidenceScores) -> String {
    let band = ConfidenceBand::for_score(scores.overall);
    format!(
        "Confidence: {}% ({})\n  recency {}%  relevance {}%  agreement {}%",
        scores.overall, band, scores.recency, scores.relevance, scores.agreement
    )
}

/// Human-readable summary of a finished run.
pub fn render_summary(snapshot: &RunSnapshot, top_n: usize) -> String {
    let run = &snapshot.run;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Topic: {}  ({} papers retrieved)",
        run.topic,
        run.papers.len()
    );

    if !run.ranked_papers.is_empty() {
        let _ = writeln!(out, "\nTop papers:");
        for (i, paper) in run.ranked_papers.iter().take(top_n).enumerate() {
            let _ = writeln!(out, "{}", paper_line(i + 1, paper));
        }
    }

    if let Some(scores) = snapshot.confidence() {
        let _ = writeln!(out, "\n{}", confidence_block(&scores));
    }

    if let Some(ref report) = run.report {
        let _ = writeln!(out, "\n{}", report.trim_end());
    }

    if let Some(ref critique) = run.critique {
        let _ = writeln!(out, "\n---\n\n## Critique\n\n{}", critique.trim_end());
    }
    out
}

/// Markdown written by `--output`.
pub fn report_document(report: &str, critique: Option<&str>) -> String {
    match critique {
        Some(critique) => format!(
            "{}\n\n---\n\n## Critique\n\n{}\n",
            report.trim_end(),
            critique.trim_end()
        ),
        None => format!("{}\n", report.trim_end()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_core::{AnalysisResult, Catalog, Claim, RunState};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_line() {
        assert_eq!(state_line(WorkflowState::Searching, 0.2), "[ 20%] searching");
        assert_eq!(state_line(WorkflowState::Complete, 1.0), "[100%] complete");
    }

    #[test]
    fn test_paper_line_unknown_year() {
        let paper = Paper::new("Graph Attention Networks", Catalog::SemanticScholar);
        assert_eq!(
            paper_line(3, &paper),
            " 3. [-] Graph Attention Networks (n.d., semantic_scholar)"
        );
        let scored = Paper {
            year: 2017,
            ..paper.with_relevance(0.875)
        };
        assert_eq!(
            paper_line(1, &scored),
            " 1. [0.88] Graph Attention Networks (2017, semantic_scholar)"
        );
    }

    #[test]
    fn test_render_summary_sections() {
        let mut run = RunState::new("gnn");
        let paper = Paper::new("A", Catalog::Arxiv).with_relevance(0.9);
        run.papers = vec![paper.clone()];
        run.ranked_papers = vec![paper];
        run.analysis = Some(AnalysisResult {
            summary: "s".into(),
            claims: vec![Claim {
                text: "c".into(),
                confidence: 0.8,
                supporting_papers: Vec::new(),
            }],
            contradictions: Vec::new(),
            gaps: Vec::new(),
        });
        run.report = Some("# Executive Summary\n".into());
        run.critique = Some("1. Weak".into());

        let text = render_summary(&run.snapshot(false), 5);
        assert!(text.contains("Topic: gnn  (1 papers retrieved)"));
        assert!(text.contains(" 1. [0.90] A"));
        assert!(text.contains("Confidence: "));
        assert!(text.contains("agreement 80%"));
        assert!(text.contains("# Executive Summary"));
        assert!(text.contains("## Critique\n\n1. Weak"));
    }

    #[test]
    fn test_report_document() {
        assert_eq!(report_document("# R\n\n", None), "# R\n");
        assert_eq!(
            report_document("# R", Some("1. x")),
            "# R\n\n---\n\n## Critique\n\n1. x\n"
        );
    }
}
