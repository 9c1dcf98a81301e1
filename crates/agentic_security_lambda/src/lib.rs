//! AWS-facing adapters and handler for the agentic-security analyzer.
//!
//! The handler is synchronous and talks to storage only through
//! [`adapters::prompt_store::PromptStore`], so it is testable without AWS.
//! The `analyzer` binary wires the S3 adapter into the Lambda runtime.

pub mod adapters;
pub mod error;
pub mod handlers;
