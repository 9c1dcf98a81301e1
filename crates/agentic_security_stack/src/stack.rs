//! The agentic-security stack: function, prompts bucket, prompt sync, read
//! grant and the two discovery outputs.

use std::collections::BTreeMap;
use std::path::Path;

use agentic_security_core::contract::{PROMPTS_BUCKET_ENV, PROMPT_KEY_ENV};
use agentic_security_core::prompt_keys::{
    destination_prefix, security_analysis_prompt_key, synced_object_key, PROMPTS_PREFIX,
    SECURITY_ANALYSIS_PROMPT,
};

use crate::asset::{fingerprint_directory, list_files, require_directory};
use crate::config::StackProps;
use crate::error::{Result, StackError};
use crate::graph::ResourceGraph;
use crate::naming::{
    derive_bucket_name, validate_account, validate_bucket_name, validate_identity,
    validate_region,
};
use crate::resources::{
    AccessGrant, AssetSource, BucketEncryption, ComputeResource, DeploymentSync, ExecutionRole,
    OutputBinding, RemovalPolicy, Resource, Runtime, StorageResource, Tags, ValueRef,
};

pub const FUNCTION_ID: &str = "AgenticAnalyzerFunction";
pub const ROLE_ID: &str = "AgenticAnalyzerFunctionRole";
pub const BUCKET_ID: &str = "PromptsBucket";
pub const SYNC_ID: &str = "PromptsDeployment";
pub const GRANT_ID: &str = "AgenticAnalyzerPromptsReadPolicy";

pub const FUNCTION_ARN_OUTPUT: &str = "FunctionArn";
pub const BUCKET_NAME_OUTPUT: &str = "PromptsBucketName";

pub const FUNCTION_HANDLER: &str = "bootstrap";
pub const FUNCTION_MEMORY_MB: u32 = 256;
pub const FUNCTION_TIMEOUT_SECS: u32 = 30;
pub const FUNCTION_DESCRIPTION: &str = "Agentic security alert analyzer written in Rust";

pub const APPLICATION_TAG: &str = "application";

const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";
const BASIC_EXECUTION_POLICY: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Object-read actions only. No write, delete or ACL actions.
pub const READ_ACTIONS: [&str; 3] = ["s3:GetObject*", "s3:GetBucket*", "s3:List*"];

/// Build the resource graph for `props`.
///
/// Pure apart from reading the two input directories. Any failure aborts
/// before a graph is returned.
pub fn build(props: &StackProps) -> Result<ResourceGraph> {
    validate_identity(&props.identity)?;
    if let Some(account) = props.environment.account() {
        validate_account(account)?;
    }
    let region = props.environment.resolved_region();
    validate_region(region)?;

    let code = code_asset(&props.code_artifact_dir)?;
    let (prompts, object_keys) = prompts_asset(&props.prompts_source_dir)?;

    let bucket_name = derive_bucket_name(props.environment.account(), region);
    validate_bucket_name(&bucket_name)?;
    if props.reserved_bucket_names.contains(&bucket_name) {
        return Err(StackError::NamingConflict {
            name: bucket_name,
            scope: format!(
                "account {} in {region}",
                props.environment.account().unwrap_or("<deploy-time>")
            ),
        });
    }

    let tags = application_tags(&props.identity);
    let mut graph = ResourceGraph::new(
        props.identity.clone(),
        format!("{} - agentic security alert analyzer", props.identity),
    );

    graph.add_resource(Resource::Storage(StorageResource {
        logical_id: BUCKET_ID.to_string(),
        name: bucket_name,
        versioned: true,
        removal_policy: RemovalPolicy::Destroy,
        encryption: BucketEncryption::S3Managed,
        auto_delete_objects: true,
        tags: tags.clone(),
    }))?;

    graph.add_resource(Resource::Sync(DeploymentSync {
        logical_id: SYNC_ID.to_string(),
        source: prompts,
        destination_bucket: ValueRef::Ref(BUCKET_ID.to_string()),
        destination_key_prefix: destination_prefix(PROMPTS_PREFIX),
        prune: true,
        object_keys,
    }))?;

    graph.add_resource(Resource::Role(ExecutionRole {
        logical_id: ROLE_ID.to_string(),
        assumed_by: LAMBDA_SERVICE_PRINCIPAL.to_string(),
        managed_policy_arns: vec![ValueRef::Sub(BASIC_EXECUTION_POLICY.to_string())],
        tags: tags.clone(),
    }))?;

    graph.add_resource(Resource::Compute(ComputeResource {
        logical_id: FUNCTION_ID.to_string(),
        runtime: Runtime::ProvidedAl2023,
        handler: FUNCTION_HANDLER.to_string(),
        code,
        memory_mb: FUNCTION_MEMORY_MB,
        timeout_secs: FUNCTION_TIMEOUT_SECS,
        description: FUNCTION_DESCRIPTION.to_string(),
        environment: BTreeMap::from([
            (
                PROMPTS_BUCKET_ENV.to_string(),
                ValueRef::Ref(BUCKET_ID.to_string()),
            ),
            (
                PROMPT_KEY_ENV.to_string(),
                ValueRef::literal(security_analysis_prompt_key()),
            ),
        ]),
        role: ValueRef::get_att(ROLE_ID, "Arn"),
        tags,
    }))?;

    graph.add_resource(Resource::Grant(AccessGrant {
        logical_id: GRANT_ID.to_string(),
        bucket: BUCKET_ID.to_string(),
        grantee: FUNCTION_ID.to_string(),
        role: ValueRef::Ref(ROLE_ID.to_string()),
        actions: READ_ACTIONS.iter().map(|action| action.to_string()).collect(),
        resources: vec![
            ValueRef::get_att(BUCKET_ID, "Arn"),
            ValueRef::Sub(format!("${{{BUCKET_ID}.Arn}}/*")),
        ],
    }))?;

    graph.add_output(OutputBinding {
        name: FUNCTION_ARN_OUTPUT.to_string(),
        value: ValueRef::get_att(FUNCTION_ID, "Arn"),
        description: "Invocation address of the agentic security analyzer".to_string(),
    })?;
    graph.add_output(OutputBinding {
        name: BUCKET_NAME_OUTPUT.to_string(),
        value: ValueRef::Ref(BUCKET_ID.to_string()),
        description: "Bucket holding the analyzer prompt configuration".to_string(),
    })?;

    graph.validate_references()?;
    tracing::info!(
        stack = graph.stack_name(),
        region,
        resources = graph.resources().len(),
        outputs = graph.outputs().len(),
        "built resource graph"
    );
    Ok(graph)
}

fn code_asset(dir: &Path) -> Result<AssetSource> {
    require_directory(dir, "code artifact directory")?;
    let entry_point = dir.join(FUNCTION_HANDLER);
    if !entry_point.is_file() {
        return Err(StackError::configuration(
            &entry_point,
            "code artifact is missing the bootstrap executable; run `cargo run -p xtask -- lambda-package` first",
        ));
    }
    Ok(AssetSource {
        path: dir.to_path_buf(),
        fingerprint: fingerprint_directory(dir)?,
    })
}

fn prompts_asset(dir: &Path) -> Result<(AssetSource, Vec<String>)> {
    require_directory(dir, "prompts source directory")?;

    let mut object_keys = Vec::new();
    for relative in list_files(dir)? {
        let key = synced_object_key(PROMPTS_PREFIX, &relative).ok_or_else(|| {
            StackError::configuration(
                dir.join(&relative),
                "prompt file name cannot be mapped to an object key",
            )
        })?;
        object_keys.push(key);
    }

    if !object_keys.contains(&security_analysis_prompt_key()) {
        tracing::warn!(
            source = %dir.display(),
            expected = SECURITY_ANALYSIS_PROMPT,
            "prompts source does not contain the prompt the analyzer loads"
        );
    }

    let source = AssetSource {
        path: dir.to_path_buf(),
        fingerprint: fingerprint_directory(dir)?,
    };
    Ok((source, object_keys))
}

fn application_tags(identity: &str) -> Tags {
    BTreeMap::from([(APPLICATION_TAG.to_string(), identity.to_string())])
}
