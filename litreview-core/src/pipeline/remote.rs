//! HTTP client for stages served by a running gateway.

use super::search::validate_topic;
use super::stages::PipelineStages;
use crate::error::StageError;
use crate::types::{AnalysisResult, Paper};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};

/// Stages invoked over HTTP against a gateway at `base_url`.
pub struct RemoteStages {
    client: Client,
    base_url: String,
}

impl RemoteStages {
    pub fn new(base_url: impl Into<String>, timeout_secs: Option<u64>) -> Result<Self, StageError> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| StageError::Unreachable {
            stage: "client".to_string(),
            message: format!("Failed to create HTTP client: {}", e),
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// POST `body` to `/{stage}` and extract `field` from the response.
    ///
    /// A non-success status is a transport failure. A success status whose
    /// body carries `error`, or lacks `field`, is an application failure.
    async fn call<T: DeserializeOwned>(
        &self,
        stage: &str,
        field: &str,
        body: Value,
    ) -> Result<T, StageError> {
        let url = format!("{}/{}", self.base_url, stage);
        debug!(url = %url, stage, "Calling remote stage");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StageError::Unreachable {
                stage: stage.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| StageError::Unreachable {
            stage: stage.to_string(),
            message: format!("Failed to read response body: {}", e),
        })?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        let error_field = parsed
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if !status.is_success() {
            error!(stage, status = status.as_u16(), body = %text, "Remote stage failed");
            return Err(StageError::Transport {
                stage: stage.to_string(),
                status: status.as_u16(),
                message: error_field.unwrap_or(text),
            });
        }

        if let Some(message) = error_field {
            return Err(StageError::Application {
                stage: stage.to_string(),
                message,
            });
        }

        parsed
            .and_then(|mut v| v.get_mut(field).map(Value::take))
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| StageError::Application {
                stage: stage.to_string(),
                message: format!("response is missing a valid `{}` field", field),
            })
    }
}

#[async_trait]
impl PipelineStages for RemoteStages {
    async fn search(&self, topic: &str) -> Result<Vec<Paper>, StageError> {
        let topic = validate_topic(topic)?;
        self.call("search", "papers", json!({ "topic": topic })).await
    }

    async fn rank(&self, topic: &str, papers: &[Paper]) -> Result<Vec<Paper>, StageError> {
        self.call(
            "rank",
            "ranked_papers",
            json!({ "topic": topic, "papers": papers }),
        )
        .await
    }

    async fn analyze(&self, topic: &str, papers: &[Paper]) -> Result<AnalysisResult, StageError> {
        self.call(
            "analyze",
            "analysis",
            json!({ "topic": topic, "papers": papers }),
        )
        .await
    }

    async fn generate_report(
        &self,
        topic: &str,
        papers: &[Paper],
        analysis: &AnalysisResult,
    ) -> Result<String, StageError> {
        self.call(
            "generate-report",
            "report",
            json!({ "topic": topic, "papers": papers, "analysis": analysis }),
        )
        .await
    }

    async fn challenge(&self, topic: &str, report: &str) -> Result<String, StageError> {
        self.call(
            "challenge",
            "challenges",
            json!({ "topic": topic, "report": report }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_vs_application_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rank")
            .with_status(500)
            .with_body(r#"{"error":"Completion service returned 500"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/challenge")
            .with_status(200)
            .with_body(r#"{"error":"quota exhausted"}"#)
            .create_async()
            .await;

        let stages = RemoteStages::new(server.url(), None).unwrap();

        let err = stages.rank("gnn", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            StageError::Transport { status: 500, ref message, .. } if message == "Completion service returned 500"
        ));

        let err = stages.challenge("gnn", "# R").await.unwrap_err();
        assert!(matches!(
            err,
            StageError::Application { ref message, .. } if message == "quota exhausted"
        ));
    }

    #[tokio::test]
    async fn test_success_body_field_extracted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate-report")
            .with_status(200)
            .with_body(r##"{"report":"# Executive Summary"}"##)
            .create_async()
            .await;
        server
            .mock("POST", "/analyze")
            .with_status(200)
            .with_body(r#"{"unexpected":true}"#)
            .create_async()
            .await;

        let stages = RemoteStages::new(format!("{}/", server.url()), None).unwrap();
        let report = stages
            .generate_report("gnn", &[], &AnalysisResult::fallback())
            .await
            .unwrap();
        assert_eq!(report, "# Executive Summary");

        let err = stages.analyze("gnn", &[]).await.unwrap_err();
        assert!(matches!(err, StageError::Application { .. }));
    }

    #[tokio::test]
    async fn test_blank_topic_rejected_locally() {
        let stages = RemoteStages::new("http://127.0.0.1:9", None).unwrap();
        let err = stages.search(" ").await.unwrap_err();
        assert!(err.is_invalid_request());
    }
}
