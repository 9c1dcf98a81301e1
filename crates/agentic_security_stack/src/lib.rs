//! Deployment stack for the agentic-security analyzer.
//!
//! This crate describes the desired resources as a [`ResourceGraph`] and
//! renders it as a template for an external provisioning engine. It never
//! creates, diffs or deletes cloud resources itself.
//!
//! - [`config`]: explicit identity/environment inputs
//! - [`stack`]: the builder and its resource policy
//! - [`graph`]: declared resources, references and deployment order
//! - [`synth`]: template rendering

pub mod asset;
pub mod config;
pub mod error;
pub mod graph;
pub mod naming;
pub mod resources;
pub mod stack;
pub mod synth;

pub use config::{StackEnvironment, StackProps};
pub use error::{Result, StackError};
pub use graph::ResourceGraph;
pub use stack::build;
pub use synth::{synthesize, write_template};
