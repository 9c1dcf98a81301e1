use std::collections::BTreeSet;
use std::path::PathBuf;

pub const DEFAULT_STACK_NAME: &str = "AgenticSecurityStack";
pub const DEFAULT_REGION: &str = "us-east-1";

pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";
pub const FALLBACK_REGION_ENV: &str = "AWS_REGION";

/// Target account and region. Either may be unknown at synthesis time; an
/// unknown region resolves to [`DEFAULT_REGION`], an unknown account is left
/// for the provisioning engine to substitute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackEnvironment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl StackEnvironment {
    pub fn new(account: Option<String>, region: Option<String>) -> Self {
        Self {
            account: non_empty(account),
            region: non_empty(region),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the environment through an arbitrary variable lookup.
    /// `CDK_DEFAULT_REGION` wins over `AWS_REGION`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let region =
            non_empty(lookup(REGION_ENV)).or_else(|| non_empty(lookup(FALLBACK_REGION_ENV)));
        Self::new(lookup(ACCOUNT_ENV), region)
    }

    /// Keep an explicit region; otherwise take whatever `lookup` resolves.
    /// The account is never filled in this way.
    pub fn with_region_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.region.is_none() {
            self.region = Self::from_lookup(lookup).region;
        }
        self
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn resolved_region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}

/// Everything the stack builder needs, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackProps {
    pub identity: String,
    pub environment: StackEnvironment,
    /// Pre-built function artifact directory (must contain `bootstrap`).
    pub code_artifact_dir: PathBuf,
    /// Local prompt files mirrored into the prompts bucket.
    pub prompts_source_dir: PathBuf,
    /// Bucket names already known to exist in the target account and region.
    pub reserved_bucket_names: BTreeSet<String>,
}

impl StackProps {
    pub fn new(
        identity: impl Into<String>,
        environment: StackEnvironment,
        code_artifact_dir: impl Into<PathBuf>,
        prompts_source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity: identity.into(),
            environment,
            code_artifact_dir: code_artifact_dir.into(),
            prompts_source_dir: prompts_source_dir.into(),
            reserved_bucket_names: BTreeSet::new(),
        }
    }

    pub fn with_reserved_bucket_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_bucket_names
            .extend(names.into_iter().map(Into::into));
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
