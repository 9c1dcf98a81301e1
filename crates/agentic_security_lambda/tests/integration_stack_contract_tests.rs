use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use agentic_security_core::contract::SecurityAlert;
use agentic_security_lambda::adapters::prompt_store::{PromptObject, PromptStore};
use agentic_security_lambda::handlers::analyze::{handle_alert, AnalyzerConfig};
use agentic_security_stack::resources::ValueRef;
use agentic_security_stack::{build, ResourceGraph, StackEnvironment, StackProps};

/// Bucket contents after a pruning sync of the repository's prompts directory.
struct MirroredBucket {
    objects: BTreeMap<String, Vec<u8>>,
}

impl PromptStore for MirroredBucket {
    fn get_object(&self, _bucket: &str, key: &str) -> Result<PromptObject, String> {
        self.objects
            .get(key)
            .map(|body| PromptObject {
                body: body.clone(),
                version_id: Some("v1".to_string()),
            })
            .ok_or_else(|| format!("NoSuchKey: {key}"))
    }
}

fn repository_prompts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../prompts")
}

fn build_stack(dist: &Path) -> ResourceGraph {
    fs::write(dist.join("bootstrap"), b"fake bootstrap").expect("write bootstrap");
    let props = StackProps::new(
        "AgenticSecurityStack",
        StackEnvironment::new(Some("123456789012".to_string()), None),
        dist,
        repository_prompts_dir(),
    );
    build(&props).expect("stack should build")
}

fn mirror(graph: &ResourceGraph) -> MirroredBucket {
    let sync = graph.sync().expect("sync");
    let prefix = &sync.destination_key_prefix;
    let objects = sync
        .object_keys
        .iter()
        .map(|key| {
            let relative = key.strip_prefix(prefix.as_str()).expect("key under prefix");
            let body = fs::read(sync.source.path.join(relative)).expect("read prompt file");
            (key.clone(), body)
        })
        .collect();
    MirroredBucket { objects }
}

/// Resolve the function's environment the way the provisioning engine
/// would: `Ref` to the bucket becomes its physical name.
fn resolved_environment(graph: &ResourceGraph) -> BTreeMap<String, String> {
    let bucket_name = graph.storage().expect("storage").name.clone();
    graph
        .compute()
        .expect("compute")
        .environment
        .iter()
        .map(|(name, value)| {
            let resolved = match value {
                ValueRef::Literal(text) => text.clone(),
                ValueRef::Ref(_) => bucket_name.clone(),
                other => panic!("unexpected environment value {other:?}"),
            };
            (name.clone(), resolved)
        })
        .collect()
}

#[test]
fn analyzer_reads_the_prompt_the_stack_syncs() {
    let dist = tempfile::tempdir().expect("tempdir");
    let graph = build_stack(dist.path());
    let environment = resolved_environment(&graph);

    let config = AnalyzerConfig::from_lookup(|key| environment.get(key).cloned())
        .expect("stack environment should configure the analyzer");
    assert_eq!(
        config.bucket,
        "agentic-security-prompts-123456789012-us-east-1"
    );

    let bucket = mirror(&graph);
    let alert = SecurityAlert {
        alert_type: Some("PublicBucket".to_string()),
        resource: Some("arn:aws:s3:::customer-exports".to_string()),
        severity: Some("High".to_string()),
        ..Default::default()
    };
    let response = handle_alert(&alert, &config, &bucket).expect("analysis should pass");

    assert_eq!(response.model, "openai/gpt-4o");
    assert_eq!(response.prompt_version.as_deref(), Some("v1"));
    assert!(response.analysis.contains("- Severity Level: High"));
    assert!(response.analysis.contains("- Number of prompt messages: 2"));
}

#[test]
fn repository_prompts_are_the_only_mirrored_keys() {
    let dist = tempfile::tempdir().expect("tempdir");
    let graph = build_stack(dist.path());

    let bucket = mirror(&graph);
    let keys: Vec<&str> = bucket.objects.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["prompts/security-analysis.prompt.yml"]);
}
