//! Declarative resource descriptors.
//!
//! These are plain values: they describe what the provisioning engine should
//! create and carry no behavior beyond reporting which other resources they
//! reference.

use std::collections::BTreeMap;
use std::path::PathBuf;

pub type Tags = BTreeMap<String, String>;

/// A value resolved either now (literal) or by the provisioning engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRef {
    Literal(String),
    /// Primary identifier of another resource (bucket name, role name, ...).
    Ref(String),
    GetAtt { resource: String, attribute: String },
    /// Deploy-time string substitution, e.g. `${AWS::AccountId}` or
    /// `${PromptsBucket.Arn}/*`.
    Sub(String),
}

impl ValueRef {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn get_att(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }

    /// Literal unless the text carries a `${...}` substitution.
    pub fn maybe_sub(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.contains("${") {
            Self::Sub(value)
        } else {
            Self::Literal(value)
        }
    }

    /// Logical IDs of resources this value points at. Pseudo parameters
    /// (`AWS::...`) are not resources and are skipped.
    pub fn referenced_resources(&self) -> Vec<&str> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Ref(resource) | Self::GetAtt { resource, .. } => vec![resource.as_str()],
            Self::Sub(template) => sub_references(template),
        }
    }
}

fn sub_references(template: &str) -> Vec<&str> {
    let mut references = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let variable = &after[..end];
        let resource = variable.split('.').next().unwrap_or(variable);
        if !resource.is_empty() && !resource.starts_with("AWS::") && !references.contains(&resource) {
            references.push(resource);
        }
        rest = &after[end + 1..];
    }
    references
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    /// Custom runtime executing a single `bootstrap` binary.
    ProvidedAl2023,
}

impl Runtime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProvidedAl2023 => "provided.al2023",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

impl RemovalPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketEncryption {
    /// Provider-managed keys (SSE-S3).
    S3Managed,
}

impl BucketEncryption {
    pub fn sse_algorithm(self) -> &'static str {
        match self {
            Self::S3Managed => "AES256",
        }
    }
}

/// A local directory shipped as a deployment asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub path: PathBuf,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRole {
    pub logical_id: String,
    pub assumed_by: String,
    pub managed_policy_arns: Vec<ValueRef>,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeResource {
    pub logical_id: String,
    pub runtime: Runtime,
    pub handler: String,
    pub code: AssetSource,
    pub memory_mb: u32,
    pub timeout_secs: u32,
    pub description: String,
    pub environment: BTreeMap<String, ValueRef>,
    pub role: ValueRef,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageResource {
    pub logical_id: String,
    pub name: String,
    pub versioned: bool,
    pub removal_policy: RemovalPolicy,
    pub encryption: BucketEncryption,
    pub auto_delete_objects: bool,
    pub tags: Tags,
}

impl StorageResource {
    pub fn name_value(&self) -> ValueRef {
        ValueRef::maybe_sub(self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSync {
    pub logical_id: String,
    pub source: AssetSource,
    pub destination_bucket: ValueRef,
    pub destination_key_prefix: String,
    pub prune: bool,
    /// Keys the destination holds after a sync. With pruning on, this is
    /// the complete key set under the prefix.
    pub object_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub logical_id: String,
    pub bucket: String,
    pub grantee: String,
    pub role: ValueRef,
    pub actions: Vec<String>,
    pub resources: Vec<ValueRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBinding {
    pub name: String,
    pub value: ValueRef,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Role(ExecutionRole),
    Storage(StorageResource),
    Compute(ComputeResource),
    Sync(DeploymentSync),
    Grant(AccessGrant),
}

impl Resource {
    pub fn logical_id(&self) -> &str {
        match self {
            Self::Role(role) => &role.logical_id,
            Self::Storage(storage) => &storage.logical_id,
            Self::Compute(compute) => &compute.logical_id,
            Self::Sync(sync) => &sync.logical_id,
            Self::Grant(grant) => &grant.logical_id,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Role(_) => "AWS::IAM::Role",
            Self::Storage(_) => "AWS::S3::Bucket",
            Self::Compute(_) => "AWS::Lambda::Function",
            Self::Sync(_) => "Custom::CDKBucketDeployment",
            Self::Grant(_) => "AWS::IAM::Policy",
        }
    }

    /// Resources this one depends on, in first-seen order.
    pub fn dependencies(&self) -> Vec<&str> {
        let values: Vec<&ValueRef> = match self {
            Self::Role(role) => role.managed_policy_arns.iter().collect(),
            Self::Storage(_) => Vec::new(),
            Self::Compute(compute) => compute
                .environment
                .values()
                .chain(std::iter::once(&compute.role))
                .collect(),
            Self::Sync(sync) => vec![&sync.destination_bucket],
            Self::Grant(grant) => grant
                .resources
                .iter()
                .chain(std::iter::once(&grant.role))
                .collect(),
        };

        let mut dependencies: Vec<&str> = Vec::new();
        let explicit = match self {
            Self::Grant(grant) => vec![grant.bucket.as_str(), grant.grantee.as_str()],
            _ => Vec::new(),
        };
        for id in values
            .into_iter()
            .flat_map(ValueRef::referenced_resources)
            .chain(explicit)
        {
            if !dependencies.contains(&id) {
                dependencies.push(id);
            }
        }
        dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_references_skip_pseudo_parameters() {
        let value = ValueRef::Sub("${PromptsBucket.Arn}/*-${AWS::Region}-${PromptsBucket}".to_string());
        assert_eq!(value.referenced_resources(), vec!["PromptsBucket"]);
    }

    #[test]
    fn maybe_sub_only_wraps_substitutions() {
        assert_eq!(
            ValueRef::maybe_sub("plain-name"),
            ValueRef::Literal("plain-name".to_string())
        );
        assert!(matches!(
            ValueRef::maybe_sub("name-${AWS::AccountId}"),
            ValueRef::Sub(_)
        ));
    }

    #[test]
    fn grant_depends_on_bucket_role_and_grantee() {
        let grant = Resource::Grant(AccessGrant {
            logical_id: "Grant".to_string(),
            bucket: "Bucket".to_string(),
            grantee: "Function".to_string(),
            role: ValueRef::Ref("Role".to_string()),
            actions: vec!["s3:GetObject*".to_string()],
            resources: vec![
                ValueRef::get_att("Bucket", "Arn"),
                ValueRef::Sub("${Bucket.Arn}/*".to_string()),
            ],
        });

        assert_eq!(grant.dependencies(), vec!["Bucket", "Role", "Function"]);
        assert_eq!(grant.resource_type(), "AWS::IAM::Policy");
    }
}
