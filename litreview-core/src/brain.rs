//! Completion-service interface.
//!
//! The language model is treated as an opaque text-completion service: a
//! system + user prompt goes in, raw (occasionally malformed) text comes out.
//! Stages talk to it only through the [`LlmProvider`] trait.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Participant role in a chat-style request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Build the system + user pair every stage sends.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
            temperature: None,
        }
    }

    /// The user prompt, if present.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A completion response.
///
/// `content` is `None` when the service answered without any text (no
/// choices, no message or null content).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// The response text, or `None` if missing or blank.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Trait for completion-service backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Perform a full completion and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

/// A mock provider for tests: replays queued responses in order and records
/// every request it receives.
pub struct MockLlmProvider {
    model: String,
    responses: Mutex<Vec<Result<CompletionResponse, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a MockLlmProvider that returns the given texts in order.
    pub fn with_responses<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let provider = Self::new();
        for text in texts {
            provider.queue_text(text.as_ref());
        }
        provider
    }

    /// Queue a text response for the next `complete` call.
    pub fn queue_text(&self, text: &str) {
        self.queue(Ok(Self::text_response(text)));
    }

    /// Queue a response with no content at all.
    pub fn queue_empty(&self) {
        self.queue(Ok(CompletionResponse {
            content: None,
            model: self.model.clone(),
            finish_reason: Some("stop".to_string()),
            usage: TokenUsage::default(),
        }));
    }

    /// Queue an error for the next `complete` call.
    pub fn queue_error(&self, error: LlmError) {
        self.queue(Err(error));
    }

    fn queue(&self, item: Result<CompletionResponse, LlmError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push(item);
        }
    }

    /// Create a simple text response for testing.
    pub fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(text.to_string()),
            model: "mock-model".to_string(),
            finish_reason: Some("stop".to_string()),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of responses still queued.
    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.responses.lock().ok().and_then(|mut responses| {
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        });
        next.unwrap_or_else(|| {
            Err(LlmError::Connection {
                message: "mock provider has no queued responses".to_string(),
            })
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
