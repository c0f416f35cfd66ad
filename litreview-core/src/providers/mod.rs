//! Completion-service provider implementations.
//!
//! A single chat-style backend is supported: any endpoint following the
//! OpenAI chat completions format. Use [`create_provider`] to build it from
//! configuration.

pub mod openai_compat;

use crate::brain::LlmProvider;
use crate::config::LlmConfig;
use crate::error::ConfigError;
use std::sync::Arc;

pub use openai_compat::OpenAiCompatibleProvider;

/// Create the completion provider described by the configuration.
///
/// Fails with [`ConfigError::EnvVarMissing`] when the bearer credential is absent.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    for warning in config.validate() {
        tracing::warn!(warning = %warning, "LLM configuration warning");
    }
    Ok(Arc::new(OpenAiCompatibleProvider::new(config)?))
}
