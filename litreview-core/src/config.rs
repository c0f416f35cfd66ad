//! Configuration system for litreview.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from the per-user `litreview/config.toml` and/or
//! `.litreview/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LitReviewConfig {
    pub llm: LlmConfig,
    pub sources: SourcesConfig,
    pub pipeline: PipelineConfig,
    pub gateway: GatewayConfig,
}

/// Completion-service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Environment variable name containing the bearer credential.
    pub api_key_env: String,
    /// Optional sampling temperature; omitted from requests when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Optional per-request timeout. No timeout is applied when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gateway.lovable.dev/v1".to_string(),
            model: "google/gemini-3-flash-preview".to_string(),
            api_key_env: "LLM_GATEWAY_API_KEY".to_string(),
            temperature: None,
            request_timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// Validate this LLM config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid. Problematic values produce
    /// human-readable warnings rather than errors.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.model.trim().is_empty() {
            warnings.push("model is empty; the completion endpoint will reject requests".into());
        }
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            warnings.push(format!(
                "temperature ({}) is outside the typical range 0.0–2.0",
                t
            ));
        }
        if self.request_timeout_secs == Some(0) {
            warnings.push("request_timeout_secs is 0; every request will time out".into());
        }
        warnings
    }

    /// Read the bearer credential from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.api_key_env.clone(),
            })
    }
}

/// Catalog adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// arXiv query endpoint.
    pub arxiv_base_url: String,
    /// Semantic Scholar graph API root.
    pub semantic_scholar_base_url: String,
    /// Results requested from each catalog.
    pub max_results: usize,
    /// Optional env var holding a Semantic Scholar API key (sent as `x-api-key`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_scholar_api_key_env: Option<String>,
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            arxiv_base_url: "http://export.arxiv.org/api/query".to_string(),
            semantic_scholar_base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            max_results: 10,
            semantic_scholar_api_key_env: None,
            user_agent: concat!("litreview/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: None,
        }
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Abstract characters shown per paper in the ranking prompt.
    pub abstract_preview_chars: usize,
    /// Claims embedded in the report prompt.
    pub report_claim_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            abstract_preview_chars: 200,
            report_claim_limit: 10,
        }
    }
}

impl LitReviewConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `LITREVIEW_`)
/// 3. Workspace-local config (`.litreview/config.toml`)
/// 4. User config (`<config dir>/litreview/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&LitReviewConfig>,
) -> Result<LitReviewConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(LitReviewConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "litreview", "litreview") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".litreview").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // LITREVIEW_LLM__MODEL, LITREVIEW_GATEWAY__PORT, ...
    figment = figment.merge(Env::prefixed("LITREVIEW_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}
