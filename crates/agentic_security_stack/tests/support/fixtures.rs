#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use agentic_security_stack::{StackEnvironment, StackProps};
use tempfile::TempDir;

pub const ACCOUNT: &str = "123456789012";

/// Workspace layout the builder reads: a packaged function artifact and a
/// prompts directory. The temp dir is removed when the fixture drops.
pub struct StackFixture {
    pub root: TempDir,
    pub lambda_dist: PathBuf,
    pub prompts_dir: PathBuf,
}

impl StackFixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let lambda_dist = root.path().join("dist").join("analyzer");
        let prompts_dir = root.path().join("prompts");
        fs::create_dir_all(&lambda_dist).expect("create lambda dist");
        fs::create_dir_all(&prompts_dir).expect("create prompts dir");
        fs::write(lambda_dist.join("bootstrap"), b"\x7fELF fake bootstrap").expect("write bootstrap");
        fs::write(
            prompts_dir.join("security-analysis.prompt.yml"),
            "messages:\n  - role: user\n    content: \"{{input}}\"\nmodel: openai/gpt-4o\n",
        )
        .expect("write prompt");

        Self {
            root,
            lambda_dist,
            prompts_dir,
        }
    }

    pub fn props(&self, identity: &str, environment: StackEnvironment) -> StackProps {
        StackProps::new(
            identity,
            environment,
            self.lambda_dist.clone(),
            self.prompts_dir.clone(),
        )
    }

    pub fn default_props(&self) -> StackProps {
        self.props(
            "AgenticSecurityStack",
            StackEnvironment::new(Some(ACCOUNT.to_string()), Some("us-east-1".to_string())),
        )
    }

    pub fn write_prompt(&self, relative: &str, body: &str) {
        let path = self.prompts_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create prompt parent");
        }
        fs::write(path, body).expect("write prompt");
    }
}
