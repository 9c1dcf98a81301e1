//! Render a [`ResourceGraph`] as a CloudFormation-style template.
//!
//! The template is an intermediate artifact for a provisioning engine, not
//! a document plain CloudFormation can deploy. The engine must supply:
//!
//! - the asset upload for `Code.AssetPath` and the sync `SourcePath`;
//! - a handler for `Custom::CDKBucketDeployment` (its `ServiceToken`),
//!   which mirrors the source into the bucket and prunes stale keys;
//! - a handler that empties the bucket before deletion when it carries the
//!   [`AUTO_DELETE_TAG`] tag.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::error::{Result, StackError};
use crate::graph::ResourceGraph;
use crate::resources::{
    AccessGrant, ComputeResource, DeploymentSync, ExecutionRole, Resource, StorageResource, Tags,
    ValueRef,
};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
pub const AUTO_DELETE_TAG: &str = "aws-cdk:auto-delete-objects";

/// Deterministic template for `graph`: map keys are ordered, so equal graphs
/// serialize to identical bytes.
pub fn synthesize(graph: &ResourceGraph) -> Result<Value> {
    let mut resources = Map::new();
    for id in graph.deployment_order()? {
        let Some(resource) = graph.resource(id) else {
            continue;
        };
        resources.insert(id.to_string(), render_resource(resource));
    }

    let mut outputs = Map::new();
    for output in graph.outputs() {
        outputs.insert(
            output.name.clone(),
            json!({
                "Description": output.description,
                "Value": render_value(&output.value),
            }),
        );
    }

    Ok(json!({
        "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
        "Description": graph.description(),
        "Resources": resources,
        "Outputs": outputs,
    }))
}

/// Write `<out_dir>/<stack>.template.json` and return its path.
pub fn write_template(graph: &ResourceGraph, out_dir: &Path) -> Result<PathBuf> {
    let template = synthesize(graph)?;
    fs::create_dir_all(out_dir).map_err(|error| {
        StackError::configuration(out_dir, format!("failed to create output directory: {error}"))
    })?;

    let path = out_dir.join(format!("{}.template.json", graph.stack_name()));
    let body = serde_json::to_string_pretty(&template)
        .map_err(|error| StackError::validation(format!("failed to encode template: {error}")))?;
    fs::write(&path, body).map_err(|error| {
        StackError::configuration(&path, format!("failed to write template: {error}"))
    })?;

    tracing::info!(path = %path.display(), "wrote template");
    Ok(path)
}

pub fn render_value(value: &ValueRef) -> Value {
    match value {
        ValueRef::Literal(text) => json!(text),
        ValueRef::Ref(resource) => json!({ "Ref": resource }),
        ValueRef::GetAtt {
            resource,
            attribute,
        } => json!({ "Fn::GetAtt": [resource, attribute] }),
        ValueRef::Sub(template) => json!({ "Fn::Sub": template }),
    }
}

fn render_resource(resource: &Resource) -> Value {
    let mut rendered = Map::new();
    rendered.insert("Type".to_string(), json!(resource.resource_type()));

    let properties = match resource {
        Resource::Role(role) => role_properties(role),
        Resource::Storage(storage) => storage_properties(storage),
        Resource::Compute(compute) => compute_properties(compute),
        Resource::Sync(sync) => sync_properties(sync),
        Resource::Grant(grant) => grant_properties(grant),
    };
    rendered.insert("Properties".to_string(), properties);

    let dependencies = resource.dependencies();
    if !dependencies.is_empty() {
        rendered.insert("DependsOn".to_string(), json!(dependencies));
    }

    if let Resource::Storage(storage) = resource {
        let policy = storage.removal_policy.as_str();
        rendered.insert("DeletionPolicy".to_string(), json!(policy));
        rendered.insert("UpdateReplacePolicy".to_string(), json!(policy));
    }

    Value::Object(rendered)
}

fn storage_properties(storage: &StorageResource) -> Value {
    let mut tags = storage.tags.clone();
    if storage.auto_delete_objects {
        tags.insert(AUTO_DELETE_TAG.to_string(), "true".to_string());
    }
    let versioning_status = if storage.versioned {
        "Enabled"
    } else {
        "Suspended"
    };

    json!({
        "BucketName": render_value(&storage.name_value()),
        "VersioningConfiguration": {
            "Status": versioning_status,
        },
        "BucketEncryption": {
            "ServerSideEncryptionConfiguration": [{
                "ServerSideEncryptionByDefault": {
                    "SSEAlgorithm": storage.encryption.sse_algorithm(),
                },
            }],
        },
        "Tags": render_tags(&tags),
    })
}

fn sync_properties(sync: &DeploymentSync) -> Value {
    json!({
        "SourcePath": sync.source.path.display().to_string(),
        "SourceHash": sync.source.fingerprint,
        "SourceObjectKeys": sync.object_keys,
        "DestinationBucketName": render_value(&sync.destination_bucket),
        "DestinationBucketKeyPrefix": sync.destination_key_prefix,
        "Prune": sync.prune,
    })
}

fn role_properties(role: &ExecutionRole) -> Value {
    let managed_policy_arns: Vec<Value> =
        role.managed_policy_arns.iter().map(render_value).collect();

    json!({
        "AssumeRolePolicyDocument": {
            "Version": "2012-10-17",
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": { "Service": role.assumed_by },
            }],
        },
        "ManagedPolicyArns": managed_policy_arns,
        "Tags": render_tags(&role.tags),
    })
}

fn compute_properties(compute: &ComputeResource) -> Value {
    let variables: Map<String, Value> = compute
        .environment
        .iter()
        .map(|(name, value)| (name.clone(), render_value(value)))
        .collect();

    json!({
        "Runtime": compute.runtime.as_str(),
        "Handler": compute.handler,
        "Code": {
            "AssetPath": compute.code.path.display().to_string(),
            "AssetHash": compute.code.fingerprint,
        },
        "MemorySize": compute.memory_mb,
        "Timeout": compute.timeout_secs,
        "Description": compute.description,
        "Environment": { "Variables": variables },
        "Role": render_value(&compute.role),
        "Tags": render_tags(&compute.tags),
    })
}

fn grant_properties(grant: &AccessGrant) -> Value {
    let resources: Vec<Value> = grant.resources.iter().map(render_value).collect();

    json!({
        "PolicyName": grant.logical_id,
        "PolicyDocument": {
            "Version": "2012-10-17",
            "Statement": [{
                "Action": grant.actions,
                "Effect": "Allow",
                "Resource": resources,
            }],
        },
        "Roles": [render_value(&grant.role)],
    })
}

fn render_tags(tags: &Tags) -> Value {
    Value::Array(
        tags.iter()
            .map(|(key, value)| json!({ "Key": key, "Value": value }))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_references_as_intrinsics() {
        assert_eq!(render_value(&ValueRef::literal("x")), json!("x"));
        assert_eq!(
            render_value(&ValueRef::Ref("PromptsBucket".to_string())),
            json!({"Ref": "PromptsBucket"})
        );
        assert_eq!(
            render_value(&ValueRef::get_att("Fn", "Arn")),
            json!({"Fn::GetAtt": ["Fn", "Arn"]})
        );
        assert_eq!(
            render_value(&ValueRef::Sub("${AWS::Region}".to_string())),
            json!({"Fn::Sub": "${AWS::Region}"})
        );
    }
}
