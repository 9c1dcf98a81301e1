use std::path::PathBuf;
use std::process::ExitCode;

use agentic_security_stack::config::{ACCOUNT_ENV, DEFAULT_STACK_NAME, REGION_ENV};
use agentic_security_stack::{build, write_template, StackEnvironment, StackProps};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "synth",
    about = "Synthesize the agentic security stack into a deployment template"
)]
struct Cli {
    /// Stack identity used for naming and tagging
    #[arg(long, default_value = DEFAULT_STACK_NAME)]
    stack_name: String,
    /// Target account (12 digits); left for deploy-time substitution if unset
    #[arg(long, env = ACCOUNT_ENV)]
    account: Option<String>,
    /// Target region (falls back to AWS_REGION, then us-east-1)
    #[arg(long, env = REGION_ENV)]
    region: Option<String>,
    /// Directory holding the pre-built `bootstrap` executable
    #[arg(long, default_value = "dist/analyzer")]
    lambda_dist: PathBuf,
    /// Directory of prompt files mirrored into the prompts bucket
    #[arg(long, default_value = "prompts")]
    prompts_dir: PathBuf,
    /// Output directory for the synthesized template
    #[arg(long, default_value = "stack.out")]
    out: PathBuf,
    /// Bucket names known to exist already in the target account
    #[arg(long = "reserved-bucket-name")]
    reserved_bucket_names: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .init();

    let cli = Cli::parse();
    let environment = StackEnvironment::new(cli.account, cli.region)
        .with_region_fallback(|key| std::env::var(key).ok());
    let props = StackProps::new(cli.stack_name, environment, cli.lambda_dist, cli.prompts_dir)
        .with_reserved_bucket_names(cli.reserved_bucket_names);

    let result = build(&props).and_then(|graph| write_template(&graph, &cli.out));
    match result {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "synthesis failed");
            ExitCode::FAILURE
        }
    }
}
