//! Shared agentic-security domain primitives.
//!
//! This crate owns the contracts that both the deployment stack and the
//! analyzer function agree on: environment variable names, prompt object key
//! conventions, alert/prompt/response payloads and the deterministic analysis
//! report. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod analysis;
pub mod contract;
pub mod prompt_keys;
