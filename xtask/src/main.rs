use std::fs;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the agentic security workspace",
    long_about = "A unified CLI for packaging the analyzer function, synthesizing\n\
                  the deployment template, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the analyzer and stage it as `bootstrap` for the custom runtime
    LambdaPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the `bootstrap` executable is written to
        #[arg(long, default_value = DEFAULT_DIST_DIR)]
        dist: String,
    },
    /// Package the analyzer, then synthesize the stack template
    Synth {
        /// Target account (12 digits)
        #[arg(long, env = "CDK_DEFAULT_ACCOUNT")]
        account: Option<String>,
        /// Target region
        #[arg(long, env = "CDK_DEFAULT_REGION")]
        region: Option<String>,
        /// Reuse an existing `bootstrap` instead of rebuilding it
        #[arg(long)]
        skip_package: bool,
        /// Directory holding `bootstrap`; packaged into and synthesized from
        #[arg(long, default_value = DEFAULT_DIST_DIR)]
        dist: String,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

const DEFAULT_DIST_DIR: &str = "dist/analyzer";
const DEFAULT_TARGET: &str = "x86_64-unknown-linux-gnu";
const ANALYZER_BIN: &str = "analyzer";

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Workspace tests
    Test,
    /// Lint + test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_analyzer(target: &str, profile: BuildProfile, dist: &Path) {
    ensure_rust_target_installed(target);
    ensure_c_linker_available(target);

    step("Build analyzer lambda binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        "agentic_security_lambda",
        "--target",
        target,
        "--bin",
        ANALYZER_BIN,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Stage bootstrap artifact");
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(binary_name(ANALYZER_BIN, target));
    stage_bootstrap(&binary_path, dist);

    eprintln!(
        "\nPackaged artifact:\n- {}",
        dist.join("bootstrap").display()
    );
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- lambda-package`"
        );
    }
}

fn ensure_c_linker_available(target: &str) {
    if !cfg!(windows) || !target.ends_with("unknown-linux-gnu") {
        return;
    }

    let env_override_keys = [
        format!("CC_{}", target.replace('-', "_")),
        format!("CC_{target}"),
        "TARGET_CC".to_string(),
        "CC".to_string(),
    ];

    for key in env_override_keys {
        if let Ok(value) = std::env::var(&key) {
            let candidate = value.trim();
            if candidate.is_empty() {
                continue;
            }
            if tool_works(candidate) {
                return;
            }
        }
    }

    let canonical = "x86_64-linux-gnu-gcc";
    if tool_works(canonical) {
        return;
    }

    panic!(
        "missing C cross-linker for target `{target}`. install `{canonical}` (or set CC_x86_64_unknown_linux_gnu) before running `cargo run -p xtask -- lambda-package`.\n\
         Tip: the AWS SDK's TLS stack needs a Linux C toolchain when cross-compiling from Windows."
    );
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };
    let args: Vec<&str> = parts.collect();

    Command::new(bin)
        .args(&args)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

/// The custom runtime executes a file named `bootstrap` at the artifact root.
fn stage_bootstrap(binary_path: &Path, dist: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    fs::create_dir_all(dist).expect("failed to create lambda dist directory");
    let bootstrap = dist.join("bootstrap");
    fs::copy(binary_path, &bootstrap).expect("failed to copy analyzer binary to bootstrap");
    set_executable(&bootstrap);
}

#[cfg(unix)]
fn set_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("failed to mark bootstrap executable");
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) {}

fn synth(account: Option<String>, region: Option<String>, dist: &Path) {
    step("Synthesize stack template");

    let args = synth_args(account, region, dist);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    run_cargo(&arg_refs);
}

fn synth_args(account: Option<String>, region: Option<String>, dist: &Path) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-p".to_string(),
        "agentic_security_stack".to_string(),
        "--bin".to_string(),
        "synth".to_string(),
        "--".to_string(),
        "--lambda-dist".to_string(),
        dist.display().to_string(),
    ];
    if let Some(account) = account {
        args.extend(["--account".to_string(), account]);
    }
    if let Some(region) = region {
        args.extend(["--region".to_string(), region]);
    }
    args
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test agentic_security_core");
    run_cargo(&["test", "-p", "agentic_security_core"]);

    step("Test agentic_security_stack");
    run_cargo(&["test", "-p", "agentic_security_stack"]);

    step("Test agentic_security_lambda");
    run_cargo(&["test", "-p", "agentic_security_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::LambdaPackage {
            target,
            profile,
            dist,
        } => {
            package_analyzer(&target, profile, Path::new(&dist));
        }
        Commands::Synth {
            account,
            region,
            skip_package,
            dist,
        } => {
            let dist = Path::new(&dist);
            if !skip_package {
                package_analyzer(DEFAULT_TARGET, BuildProfile::Release, dist);
            }
            synth(account, region, dist);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synth_skip_package_uses_the_given_dist_directory() {
        let cli = Cli::try_parse_from(["xtask", "synth", "--skip-package", "--dist", "out/custom"])
            .expect("cli should parse");
        let Commands::Synth {
            dist, skip_package, ..
        } = cli.command
        else {
            panic!("expected synth command");
        };
        assert!(skip_package);

        let args = synth_args(None, None, Path::new(&dist));
        let position = args
            .iter()
            .position(|arg| arg == "--lambda-dist")
            .expect("lambda dist flag");
        assert_eq!(args[position + 1], "out/custom");
    }

    #[test]
    fn synth_defaults_to_the_packaging_dist_directory() {
        let cli = Cli::try_parse_from(["xtask", "synth"]).expect("cli should parse");
        let Commands::Synth { dist, .. } = cli.command else {
            panic!("expected synth command");
        };
        assert_eq!(dist, DEFAULT_DIST_DIR);
    }

    #[test]
    fn synth_forwards_account_and_region() {
        let args = synth_args(
            Some("123456789012".to_string()),
            Some("eu-west-1".to_string()),
            Path::new(DEFAULT_DIST_DIR),
        );
        assert!(args.ends_with(&[
            "--account".to_string(),
            "123456789012".to_string(),
            "--region".to_string(),
            "eu-west-1".to_string(),
        ]));
    }
}
