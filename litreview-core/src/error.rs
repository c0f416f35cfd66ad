//! Error types for the litreview core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the completion service, paper catalogs, configuration, the
//! uniform stage-failure shape and the pipeline orchestrator.

/// Top-level error type for the litreview core library.
#[derive(Debug, thiserror::Error)]
pub enum LitReviewError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from completion-service interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

/// Errors from the external paper catalogs.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{source_name} request failed: {message}")]
    Request {
        source_name: String,
        message: String,
    },

    #[error("{source_name} returned status {status}: {body}")]
    Status {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {source_name} response: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Failed to create HTTP client: {message}")]
    Client { message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// The uniform failure shape every stage returns at its boundary.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("{message}")]
    InvalidRequest { message: String },

    /// Non-success HTTP status from a remote stage.
    #[error("Stage '{stage}' returned HTTP {status}: {message}")]
    Transport {
        stage: String,
        status: u16,
        message: String,
    },

    /// The remote stage could not be reached at all.
    #[error("Stage '{stage}' unreachable: {message}")]
    Unreachable { stage: String, message: String },

    /// An `error` field embedded in a success-status body.
    #[error("Stage '{stage}' failed: {message}")]
    Application { stage: String, message: String },
}

impl StageError {
    /// Whether the caller's request itself was at fault.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, StageError::InvalidRequest { .. })
    }
}

/// Errors from the pipeline orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("A pipeline run is already in progress")]
    AlreadyRunning,

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("No report is available to challenge")]
    NoReport,

    #[error("A challenge is already in progress")]
    ChallengeInProgress,

    #[error("{stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },
}

/// A type alias for results using the top-level `LitReviewError`.
pub type Result<T> = std::result::Result<T, LitReviewError>;
