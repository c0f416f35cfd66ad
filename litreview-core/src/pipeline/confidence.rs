//! Deterministic confidence scoring over a paper set and its analysis.
//!
//! Four integer percentages are produced:
//!
//! - **recency**: mean of `max(0, 1 - age / 20)` per paper, where `age` is
//!   years before the current year and an unknown year counts as ten years old.
//! - **relevance**: mean relevance score, unscored papers counting as 0.5.
//! - **agreement**: mean claim confidence.
//! - **overall**: `0.15 * recency + 0.35 * relevance + 0.50 * agreement`,
//!   computed from the already-rounded components.
//!
//! Empty inputs score 0. All rounding is half-up.

use crate::types::{AnalysisResult, ConfidenceScores, Paper};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

const RECENCY_WEIGHT: u32 = 15;
const RELEVANCE_WEIGHT: u32 = 35;
const AGREEMENT_WEIGHT: u32 = 50;

/// Years over which recency decays from 1 to 0.
const RECENCY_HORIZON_YEARS: f64 = 20.0;
/// Assumed age of a paper with no known year.
const UNKNOWN_YEAR_AGE: i32 = 10;
const UNSCORED_RELEVANCE: f64 = 0.5;

/// Qualitative reading of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            80.. => ConfidenceBand::High,
            50..=79 => ConfidenceBand::Medium,
            _ => ConfidenceBand::Low,
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceBand::High => write!(f, "high"),
            ConfidenceBand::Medium => write!(f, "medium"),
            ConfidenceBand::Low => write!(f, "low"),
        }
    }
}

/// Round a non-negative value half-up to the nearest integer.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn percent(mean: f64) -> u8 {
    round_half_up(mean * 100.0).clamp(0.0, 100.0) as u8
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Score against an explicit current year.
pub fn score_at(papers: &[Paper], analysis: &AnalysisResult, current_year: i32) -> ConfidenceScores {
    let recency = mean(papers.iter().map(|p| {
        let age = if p.has_year() {
            f64::from(current_year) - f64::from(p.year)
        } else {
            f64::from(UNKNOWN_YEAR_AGE)
        };
        (1.0 - age / RECENCY_HORIZON_YEARS).clamp(0.0, 1.0)
    }))
    .map(percent)
    .unwrap_or(0);

    let relevance = mean(
        papers
            .iter()
            .map(|p| p.relevance_score.unwrap_or(UNSCORED_RELEVANCE)),
    )
    .map(percent)
    .unwrap_or(0);

    let agreement = mean(analysis.claims.iter().map(|c| c.confidence))
        .map(percent)
        .unwrap_or(0);

    ConfidenceScores {
        recency,
        relevance,
        agreement,
        overall: overall(recency, relevance, agreement),
    }
}

/// Score against the current calendar year (UTC).
pub fn score(papers: &[Paper], analysis: &AnalysisResult) -> ConfidenceScores {
    score_at(papers, analysis, chrono::Utc::now().year())
}

/// Weighted combination of the rounded components, in exact integer arithmetic.
pub fn overall(recency: u8, relevance: u8, agreement: u8) -> u8 {
    let weighted = u32::from(recency) * RECENCY_WEIGHT
        + u32::from(relevance) * RELEVANCE_WEIGHT
        + u32::from(agreement) * AGREEMENT_WEIGHT;
    // Weights sum to 100, so this is round-half-up of weighted / 100.
    ((weighted + 50) / 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Catalog, Claim};
    use pretty_assertions::assert_eq;

    fn paper(year: i32, relevance: Option<f64>) -> Paper {
        let mut p = Paper::new("p", Catalog::Arxiv);
        p.year = year;
        p.relevance_score = relevance;
        p
    }

    fn claims(confidences: &[f64]) -> AnalysisResult {
        AnalysisResult {
            claims: confidences
                .iter()
                .map(|c| Claim {
                    text: "c".into(),
                    confidence: *c,
                    supporting_papers: Vec::new(),
                })
                .collect(),
            ..AnalysisResult::fallback()
        }
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let scores = score_at(&[], &AnalysisResult::fallback(), 2025);
        assert_eq!(scores, ConfidenceScores::default());
    }

    #[test]
    fn test_known_values() {
        let papers = vec![paper(2025, Some(0.9)), paper(2015, Some(0.7))];
        let scores = score_at(&papers, &claims(&[0.8, 0.6]), 2025);
        // recency: (1.0 + 0.5) / 2 = 0.75
        assert_eq!(scores.recency, 75);
        assert_eq!(scores.relevance, 80);
        assert_eq!(scores.agreement, 70);
        // 11.25 + 28 + 35 = 74.25
        assert_eq!(scores.overall, 74);
    }

    #[test]
    fn test_unknown_year_counts_as_ten_years_old() {
        let scores = score_at(&[paper(0, None)], &AnalysisResult::fallback(), 2025);
        assert_eq!(scores.recency, 50);
        assert_eq!(scores.relevance, 50);
    }

    #[test]
    fn test_old_and_future_papers_are_bounded() {
        assert_eq!(score_at(&[paper(1950, None)], &claims(&[]), 2025).recency, 0);
        assert_eq!(score_at(&[paper(2030, None)], &claims(&[]), 2025).recency, 100);
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let ancient: Paper = serde_json::from_str(
            r#"{"id":"x","title":"t","source":"arxiv","year":-2147483000}"#,
        )
        .unwrap();
        let scores = score_at(&[ancient], &AnalysisResult::fallback(), 2026);
        assert_eq!(scores.recency, 0);

        let far_future = score_at(&[paper(i32::MAX, None)], &claims(&[]), i32::MIN);
        assert_eq!(far_future.recency, 100);
    }

    #[test]
    fn test_rounding_is_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.49), 2.0);
        // 0.15*50 + 0.35*50 + 0.5*51 = 50.5
        assert_eq!(overall(50, 50, 51), 51);
        assert_eq!(score_at(&[], &claims(&[0.125]), 2025).agreement, 13);
    }

    #[test]
    fn test_bands() {
        assert_eq!(ConfidenceBand::for_score(80), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::for_score(79), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::for_score(50), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::for_score(49), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::High.to_string(), "high");
    }
}
