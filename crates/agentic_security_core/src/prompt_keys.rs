use std::path::{Component, Path};

/// Key prefix under which prompt files are mirrored into the prompts bucket.
pub const PROMPTS_PREFIX: &str = "prompts";
/// File name of the prompt the analyzer loads.
pub const SECURITY_ANALYSIS_PROMPT: &str = "security-analysis.prompt.yml";

/// Normalized destination prefix: no leading slash, exactly one trailing slash.
/// An empty prefix stays empty (bucket root).
pub fn destination_prefix(base_prefix: &str) -> String {
    let trimmed = base_prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

pub fn prompt_object_key(base_prefix: &str, file_name: &str) -> String {
    format!(
        "{}{}",
        destination_prefix(base_prefix),
        file_name.trim_start_matches('/')
    )
}

pub fn security_analysis_prompt_key() -> String {
    prompt_object_key(PROMPTS_PREFIX, SECURITY_ANALYSIS_PROMPT)
}

/// Object key a synced file lands on, given its path relative to the source
/// directory. Path separators are always `/` regardless of host platform.
pub fn synced_object_key(base_prefix: &str, relative_path: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative_path.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(prompt_object_key(base_prefix, &segments.join("/")))
}
