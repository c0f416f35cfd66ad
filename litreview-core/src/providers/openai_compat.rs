//! OpenAI-compatible chat-completions provider.
//!
//! Talks to any endpoint that follows the OpenAI chat completions API format,
//! authenticated with a bearer credential read from the environment.

use crate::brain::{CompletionRequest, CompletionResponse, LlmProvider, Role, TokenUsage};
use crate::config::LlmConfig;
use crate::error::{ConfigError, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};

/// OpenAI-compatible LLM provider.
pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    /// Create a new provider from configuration.
    ///
    /// Reads the API key from the environment variable named by `config.api_key_env`.
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key()?;
        Self::new_with_key(config, api_key)
    }

    /// Create a new provider with an explicitly provided API key.
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| ConfigError::Invalid {
            message: format!("Failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Build the JSON request body.
    fn request_body(&self, request: &CompletionRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                json!({ "role": role, "content": m.content })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = request.temperature.or(self.temperature) {
            body["temperature"] = json!(t);
        }
        body
    }

    /// Parse an OpenAI-format response body into a CompletionResponse.
    ///
    /// Missing choices or message content is not an error: the response simply
    /// carries no text and the calling stage applies its fallback.
    fn parse_response(body: &Value, model: &str) -> CompletionResponse {
        let choice = body.get("choices").and_then(|c| c.get(0));

        let content = choice
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string());

        let finish_reason = choice
            .and_then(|c| c.get("finish_reason"))
            .and_then(|f| f.as_str())
            .map(|s| s.to_string());

        let usage_obj = body.get("usage");
        let usage = TokenUsage {
            input_tokens: usage_obj
                .and_then(|u| u.get("prompt_tokens"))
                .and_then(|t| t.as_u64())
                .unwrap_or(0) as usize,
            output_tokens: usage_obj
                .and_then(|u| u.get("completion_tokens"))
                .and_then(|t| t.as_u64())
                .unwrap_or(0) as usize,
        };

        let resp_model = body
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(model)
            .to_string();

        CompletionResponse {
            content,
            model: resp_model,
            finish_reason,
            usage,
        }
    }

    /// Map an HTTP status code to the appropriate LlmError.
    fn map_http_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        match status.as_u16() {
            401 | 403 => LlmError::AuthFailed {
                provider: "OpenAI-compatible".to_string(),
            },
            429 => {
                let retry_secs = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| {
                        v.get("error")?
                            .get("message")?
                            .as_str()
                            .map(|s| s.to_string())
                    })
                    .and_then(|msg| {
                        // "Rate limit reached ... try again in 20s"
                        msg.split("in ")
                            .last()
                            .and_then(|s| s.trim().trim_end_matches('s').parse::<u64>().ok())
                    })
                    .unwrap_or(5);
                LlmError::RateLimited {
                    retry_after_secs: retry_secs,
                }
            }
            code => LlmError::Status {
                status: code,
                body: body.to_string(),
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(&request);

        debug!(url = %url, model = %self.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        let response_body = response.text().await.map_err(|e| LlmError::ApiRequest {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %response_body, "Completion service error");
            return Err(Self::map_http_error(status, &response_body));
        }

        let json: Value =
            serde_json::from_str(&response_body).map_err(|e| LlmError::ResponseParse {
                message: format!("Invalid JSON: {}", e),
            })?;

        Ok(Self::parse_response(&json, &self.model))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
            api_key_env: "LITREVIEW_TEST_OPENAI_KEY".to_string(),
            temperature: None,
            request_timeout_secs: Some(5),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let provider =
            OpenAiCompatibleProvider::new_with_key(&test_config("http://x/v1/"), "k".into())
                .unwrap();
        let body = provider.request_body(&CompletionRequest::new("sys", "user"));
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert!(body.get("temperature").is_none());
        assert_eq!(provider.base_url, "http://x/v1");
    }

    #[test]
    fn test_parse_response_text() {
        let body = json!({
            "model": "served-model",
            "choices": [{"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let resp = OpenAiCompatibleProvider::parse_response(&body, "test-model");
        assert_eq!(resp.content.as_deref(), Some("hello"));
        assert_eq!(resp.model, "served-model");
        assert_eq!(resp.usage.input_tokens, 12);
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let resp = OpenAiCompatibleProvider::parse_response(&json!({}), "test-model");
        assert!(resp.content.is_none());
        assert_eq!(resp.model, "test-model");
    }

    #[test]
    fn test_map_http_error() {
        let err = OpenAiCompatibleProvider::map_http_error(
            reqwest::StatusCode::UNAUTHORIZED,
            "nope",
        );
        assert!(matches!(err, LlmError::AuthFailed { .. }));

        let err = OpenAiCompatibleProvider::map_http_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit reached, try again in 20s"}}"#,
        );
        assert!(matches!(err, LlmError::RateLimited { retry_after_secs: 20 }));

        let err = OpenAiCompatibleProvider::map_http_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "upstream exploded",
        );
        assert!(
            matches!(err, LlmError::Status { status: 500, ref body } if body == "upstream exploded")
        );
    }

    #[test]
    fn test_new_without_key_is_config_error() {
        let config = LlmConfig {
            api_key_env: "LITREVIEW_TEST_KEY_NEVER_SET_ANYWHERE".into(),
            ..LlmConfig::default()
        };
        let err = OpenAiCompatibleProvider::new(&config).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarMissing { .. }));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"[]"}}]}"#)
            .create_async()
            .await;

        let config = test_config(&format!("{}/v1", server.url()));
        let provider = OpenAiCompatibleProvider::new_with_key(&config, "secret".into()).unwrap();
        let resp = provider
            .complete(CompletionRequest::new("s", "u"))
            .await
            .unwrap();
        assert_eq!(resp.content.as_deref(), Some("[]"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_server_error_is_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let config = test_config(&format!("{}/v1", server.url()));
        let provider = OpenAiCompatibleProvider::new_with_key(&config, "secret".into()).unwrap();
        let err = provider
            .complete(CompletionRequest::new("s", "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 500, .. }));
    }
}
