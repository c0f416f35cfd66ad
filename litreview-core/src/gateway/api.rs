//! Request and response bodies for the gateway endpoints.

use crate::types::{AnalysisResult, Paper};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub papers: Vec<Paper>,
}

/// Body shared by `/rank` and `/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PapersRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub papers: Vec<Paper>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub ranked_papers: Vec<Paper>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub papers: Vec<Paper>,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub report: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub report: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub challenges: String,
}

/// Failure body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
