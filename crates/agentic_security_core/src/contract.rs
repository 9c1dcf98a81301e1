use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Environment variable carrying the prompts bucket name into the analyzer.
pub const PROMPTS_BUCKET_ENV: &str = "PROMPTS_BUCKET";
/// Environment variable carrying the prompt object key into the analyzer.
pub const PROMPT_KEY_ENV: &str = "PROMPT_KEY";

/// Incoming security alert. Every field is optional; the analysis report
/// substitutes defaults for whatever the alert source leaves out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub alert_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<Value>,
}

// Empty strings and maps are left out of the serialized alert, the same as
// absent ones.
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn is_empty_map(value: &Option<Map<String, Value>>) -> bool {
    value.as_ref().map_or(true, Map::is_empty)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

/// Prompt file layout stored in the prompts bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub test_data: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub evaluators: Vec<serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
}

pub type PromptParseError = serde_yaml::Error;

pub fn parse_prompt_config(body: &[u8]) -> Result<PromptConfig, PromptParseError> {
    serde_yaml::from_slice(body)
}
