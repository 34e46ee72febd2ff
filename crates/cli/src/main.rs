//! Specshot CLI - Main Entry Point
//!
//! Command-line access to run directories, screenshot baselines, failure
//! bundles and repair suggestions stored under a project's artifact root.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use specshot_common::SpecshotConfig;

mod commands;
mod output;

use commands::{baseline, compare, failure, repair, run};

/// Config file looked up in the project root
const CONFIG_FILE: &str = "specshot.toml";

/// Specshot CLI - artifacts for spec-driven browser tests
#[derive(Parser)]
#[command(name = "specshot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root
    #[arg(long, env = "SPECSHOT_ROOT", default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to <root>/specshot.toml)
    #[arg(long, env = "SPECSHOT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage test runs
    #[command(subcommand)]
    Run(run::RunCommands),

    /// Manage screenshot baselines
    #[command(subcommand)]
    Baseline(baseline::BaselineCommands),

    /// Compare two images
    Compare(compare::CompareArgs),

    /// Build and inspect failure bundles
    #[command(subcommand)]
    Failure(failure::FailureCommands),

    /// Classify failures and plan repairs
    #[command(subcommand)]
    Repair(repair::RepairCommands),
}

/// Load the config and anchor a relative project root at `--root`
fn load_config(root: &Path, path: Option<&Path>) -> anyhow::Result<SpecshotConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(CONFIG_FILE));
    let mut config = SpecshotConfig::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    config.project_root = root.join(&config.project_root);
    tracing::debug!("Artifact root: {:?}", config.artifact_root());
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.root, cli.config.as_deref())?;

    match cli.command {
        Commands::Run(cmd) => run::execute(cmd, &config, cli.format)?,
        Commands::Baseline(cmd) => baseline::execute(cmd, &config, cli.format)?,
        Commands::Compare(args) => compare::execute(args, &config, cli.format)?,
        Commands::Failure(cmd) => failure::execute(cmd, cli.format)?,
        Commands::Repair(cmd) => repair::execute(cmd, cli.format)?,
    }

    Ok(())
}
