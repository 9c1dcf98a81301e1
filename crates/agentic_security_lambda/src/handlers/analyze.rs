use std::time::Instant;

use agentic_security_core::analysis::{generate_security_analysis, render_prompt_messages};
use agentic_security_core::contract::{
    parse_prompt_config, AnalysisResponse, PromptConfig, SecurityAlert, PROMPTS_BUCKET_ENV,
    PROMPT_KEY_ENV,
};

use crate::adapters::prompt_store::PromptStore;
use crate::error::AnalyzerError;

const COMPONENT: &str = "analyzer";

/// Where the analyzer finds its prompt. Both values are injected by the
/// deployment stack as environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub bucket: String,
    pub prompt_key: String,
}

impl AnalyzerConfig {
    pub fn from_env() -> Result<Self, AnalyzerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AnalyzerError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        match (read(PROMPTS_BUCKET_ENV), read(PROMPT_KEY_ENV)) {
            (Some(bucket), Some(prompt_key)) => Ok(Self { bucket, prompt_key }),
            _ => Err(AnalyzerError::Configuration(format!(
                "{PROMPTS_BUCKET_ENV} and {PROMPT_KEY_ENV} environment variables must be set"
            ))),
        }
    }
}

/// A parsed prompt plus the storage version it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPrompt {
    pub config: PromptConfig,
    pub version_id: Option<String>,
}

pub fn load_prompt(
    config: &AnalyzerConfig,
    store: &impl PromptStore,
) -> Result<LoadedPrompt, AnalyzerError> {
    let object = store
        .get_object(&config.bucket, &config.prompt_key)
        .map_err(|message| AnalyzerError::PromptFetch {
            bucket: config.bucket.clone(),
            key: config.prompt_key.clone(),
            message,
        })?;
    let prompt = parse_prompt_config(&object.body)?;

    tracing::info!(
        component = COMPONENT,
        event = "prompt_loaded",
        model = %prompt.model,
        version_id = object.version_id.as_deref().unwrap_or("unversioned"),
        "loaded prompt configuration"
    );
    Ok(LoadedPrompt {
        config: prompt,
        version_id: object.version_id,
    })
}

pub fn handle_alert(
    alert: &SecurityAlert,
    config: &AnalyzerConfig,
    store: &impl PromptStore,
) -> Result<AnalysisResponse, AnalyzerError> {
    let started_at = Instant::now();
    let resource = alert.resource.as_deref().unwrap_or("unknown");
    tracing::info!(
        component = COMPONENT,
        event = "alert_received",
        resource,
        "processing security alert"
    );

    let prompt = load_prompt(config, store)?;
    let messages = render_prompt_messages(alert, &prompt.config)?;
    let analysis = generate_security_analysis(alert, &prompt.config.model, &messages);

    let elapsed_ms = started_at.elapsed().as_millis();
    tracing::info!(
        component = COMPONENT,
        event = "alert_processed",
        resource,
        duration_ms = elapsed_ms as u64,
        prompt_messages = messages.len(),
        "processed security alert"
    );

    Ok(AnalysisResponse {
        analysis,
        model: prompt.config.model,
        prompt_version: prompt.version_id,
        processing_time: Some(format!("{elapsed_ms}ms")),
    })
}
