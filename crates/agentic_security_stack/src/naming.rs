use crate::error::{Result, StackError};

/// Fixed prefix of the prompts bucket name.
pub const BUCKET_NAME_PREFIX: &str = "agentic-security-prompts";
/// Deploy-time substitution used when the account is unknown at synthesis.
pub const ACCOUNT_ID_PLACEHOLDER: &str = "${AWS::AccountId}";

const MAX_IDENTITY_LEN: usize = 128;
const ACCOUNT_ID_LEN: usize = 12;
const MIN_BUCKET_NAME_LEN: usize = 3;
const MAX_BUCKET_NAME_LEN: usize = 63;

/// `<prefix>-<account>-<region>`. No random suffix: the same target always
/// yields the same name, so repeated synthesis is idempotent.
pub fn derive_bucket_name(account: Option<&str>, region: &str) -> String {
    let account = account.unwrap_or(ACCOUNT_ID_PLACEHOLDER);
    format!("{BUCKET_NAME_PREFIX}-{account}-{region}")
}

pub fn validate_identity(identity: &str) -> Result<()> {
    if identity.trim().is_empty() {
        return Err(StackError::validation("stack identity cannot be empty"));
    }
    if identity.len() > MAX_IDENTITY_LEN {
        return Err(StackError::validation(format!(
            "stack identity exceeds {MAX_IDENTITY_LEN} characters"
        )));
    }

    let mut chars = identity.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(StackError::validation(format!(
            "stack identity '{identity}' must start with a letter and contain only letters, digits and hyphens"
        )));
    }
    Ok(())
}

pub fn validate_account(account: &str) -> Result<()> {
    if account.len() != ACCOUNT_ID_LEN || !account.chars().all(|c| c.is_ascii_digit()) {
        return Err(StackError::validation(format!(
            "account '{account}' must be a {ACCOUNT_ID_LEN}-digit identifier"
        )));
    }
    Ok(())
}

/// Accepts region identifiers shaped like `us-east-1` or `us-gov-west-1`.
pub fn validate_region(region: &str) -> Result<()> {
    let segments: Vec<&str> = region.split('-').collect();
    let well_formed = segments.len() >= 3
        && segments.iter().all(|segment| !segment.is_empty())
        && segments[..segments.len() - 1]
            .iter()
            .all(|segment| segment.chars().all(|c| c.is_ascii_lowercase()))
        && segments[segments.len() - 1].chars().all(|c| c.is_ascii_digit());

    if !well_formed {
        return Err(StackError::validation(format!(
            "region '{region}' is not a valid region identifier"
        )));
    }
    Ok(())
}

/// S3 naming rules. A deploy-time account placeholder is checked as if it
/// were a concrete 12-digit account.
pub fn validate_bucket_name(name: &str) -> Result<()> {
    let concrete = name.replace(ACCOUNT_ID_PLACEHOLDER, &"0".repeat(ACCOUNT_ID_LEN));

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&concrete.len()) {
        return Err(StackError::validation(format!(
            "bucket name '{name}' must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters"
        )));
    }

    let allowed = concrete
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let alphanumeric_edge =
        |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !allowed
        || !alphanumeric_edge(concrete.chars().next())
        || !alphanumeric_edge(concrete.chars().last())
    {
        return Err(StackError::validation(format!(
            "bucket name '{name}' must use lowercase letters, digits and hyphens, starting and ending alphanumeric"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_bucket_name_from_account_and_region() {
        assert_eq!(
            derive_bucket_name(Some("123456789012"), "us-east-1"),
            "agentic-security-prompts-123456789012-us-east-1"
        );
    }

    #[test]
    fn unknown_account_uses_deploy_time_substitution() {
        let name = derive_bucket_name(None, "eu-west-1");
        assert_eq!(name, "agentic-security-prompts-${AWS::AccountId}-eu-west-1");
        validate_bucket_name(&name).expect("placeholder name should validate");
    }

    #[test]
    fn rejects_empty_and_malformed_identity() {
        assert!(matches!(validate_identity(""), Err(StackError::Validation(_))));
        assert!(matches!(validate_identity("   "), Err(StackError::Validation(_))));
        assert!(validate_identity("1Stack").is_err());
        assert!(validate_identity("Agentic_Security").is_err());
        validate_identity("AgenticSecurityStack").expect("identity should pass");
        validate_identity("agentic-security-dev").expect("identity should pass");
    }

    #[test]
    fn validates_account_shape() {
        validate_account("123456789012").expect("account should pass");
        assert!(validate_account("12345").is_err());
        assert!(validate_account("12345678901a").is_err());
    }

    #[test]
    fn validates_region_shape() {
        for region in ["us-east-1", "ap-southeast-2", "us-gov-west-1"] {
            validate_region(region).expect("region should pass");
        }
        for region in ["", "useast1", "US-EAST-1", "us-east-", "us-east-one"] {
            assert!(validate_region(region).is_err(), "{region} should fail");
        }
    }

    #[test]
    fn rejects_bucket_names_breaking_s3_rules() {
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("Upper-case").is_err());
        assert!(validate_bucket_name("-leading").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        validate_bucket_name("agentic-security-prompts-123456789012-ap-southeast-2")
            .expect("name should pass");
    }
}
