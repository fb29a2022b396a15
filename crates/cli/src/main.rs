mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stagehand_lib::config::StageConfig;
use stagehand_lib::pipeline::PipelineOptions;
use stagehand_lib::platform::LocateOptions;

use crate::output::OutputFormat;

/// stagehand - build and stage a package's generated data after install
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(flatten)]
  target: TargetArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct TargetArgs {
  /// JSON config file overriding the default layout
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Package source tree the install runs from
  #[arg(long, global = true, default_value = ".")]
  source_root: PathBuf,

  /// Interpreter the package was installed with
  #[arg(long, global = true)]
  python: Option<PathBuf>,

  /// Installed package directory (skips the interpreter query)
  #[arg(long, global = true)]
  package_dir: Option<PathBuf>,

  /// Site-packages directory containing the installed package
  #[arg(long, global = true)]
  site_packages: Option<PathBuf>,

  /// Directory receiving the companion executables
  #[arg(long, global = true)]
  bin_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Install binaries, run the build, stage its outputs and clean up
  Run,

  /// Show what `run` would do without changing anything
  Plan,

  /// Remove the build workspace's intermediate directories
  Clean,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = StageConfig::load_or_default(cli.target.config.as_deref()).context("Failed to load config")?;
  let source_root = std::path::absolute(&cli.target.source_root)
    .with_context(|| format!("Invalid source root: {}", cli.target.source_root.display()))?;

  let mut options = PipelineOptions::new(source_root);
  options.locate = LocateOptions {
    package_dir: cli.target.package_dir.or_else(|| config.package_dir.clone()),
    site_packages: cli.target.site_packages,
    bin_dir: cli.target.bin_dir,
    python: cli.target.python,
  };

  match cli.command {
    Commands::Run => cmd::cmd_run(&config, &options, cli.output),
    Commands::Plan => cmd::cmd_plan(&config, &options, cli.output),
    Commands::Clean => cmd::cmd_clean(&config, &options, cli.output),
  }
}
