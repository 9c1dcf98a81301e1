use agentic_security_core::contract::PromptParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("{0}")]
    Configuration(String),

    #[error("failed to get prompt from bucket {bucket}, key {key}: {message}")]
    PromptFetch {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("failed to parse prompt YAML: {0}")]
    PromptParse(#[from] PromptParseError),

    #[error("failed to render alert: {0}")]
    Serialization(#[from] serde_json::Error),
}
