use crate::contract::{PromptConfig, SecurityAlert};

/// Placeholder in prompt message content replaced by the alert JSON.
pub const INPUT_PLACEHOLDER: &str = "{{input}}";

const UNKNOWN: &str = "Unknown";
const DEFAULT_SEVERITY: &str = "Medium";
const DEFAULT_DESCRIPTION: &str = "Security alert detected";

/// Substitute the pretty-printed alert into every prompt message and render
/// each one as `**<role>**: <content>`.
pub fn render_prompt_messages(
    alert: &SecurityAlert,
    prompt: &PromptConfig,
) -> Result<Vec<String>, serde_json::Error> {
    let alert_json = serde_json::to_string_pretty(alert)?;
    Ok(prompt
        .messages
        .iter()
        .map(|message| {
            format!(
                "**{}**: {}",
                message.role,
                message.content.replace(INPUT_PLACEHOLDER, &alert_json)
            )
        })
        .collect())
}

/// Deterministic markdown report for an alert. No model is called; the
/// report names the prompt's model so callers can trace which prompt
/// revision produced it.
pub fn generate_security_analysis(
    alert: &SecurityAlert,
    model: &str,
    prompt_messages: &[String],
) -> String {
    format!(
        "### Alert Summary
- Alert Type: {alert_type}
- Resource(s) Involved: {resource}
- AWS Region: {region}
- Severity Level: {severity}
- Initial Assessment: Automated analysis based on alert metadata

### Analysis
- **Root Cause**: {description}
- **Potential Impact**: Varies based on resource exposure and access patterns
- **False Positive Likelihood**: Medium - requires manual verification
- **Related AWS Services Involved**: IAM, S3, CloudTrail, VPC

### Recommendations
- [Immediate] Review resource permissions and access logs
- [Short-term] Implement least-privilege access controls
- [Long-term] Set up automated monitoring and alerting

### Missing Information
- [Access Logs] Required to determine if unauthorized access occurred
- [Resource Configuration] Needed to assess current security posture

---
**Processing Details:**
- Model: {model}
- Alert processed at: {timestamp}
- Number of prompt messages: {message_count}",
        alert_type = value_or(alert.alert_type.as_deref(), UNKNOWN),
        resource = value_or(alert.resource.as_deref(), UNKNOWN),
        region = value_or(alert.region.as_deref(), UNKNOWN),
        severity = value_or(alert.severity.as_deref(), DEFAULT_SEVERITY),
        description = value_or(alert.description.as_deref(), DEFAULT_DESCRIPTION),
        model = value_or(Some(model), UNKNOWN),
        timestamp = value_or(alert.timestamp.as_deref(), UNKNOWN),
        message_count = prompt_messages.len(),
    )
}

fn value_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => fallback,
    }
}
