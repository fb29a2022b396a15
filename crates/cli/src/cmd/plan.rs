//! Implementation of the `stagehand plan` command.
//!
//! Resolves the installation target and prints every step `run` would take.

use anyhow::{Context, Result};

use stagehand_lib::config::StageConfig;
use stagehand_lib::pipeline::{PipelineOptions, plan};

use crate::output::{OutputFormat, print_info, print_json, print_mapping, print_stat};

pub fn cmd_plan(config: &StageConfig, options: &PipelineOptions, output: OutputFormat) -> Result<()> {
  let plan = plan(config, options).context("Failed to resolve installation target")?;

  if output.is_json() {
    return print_json(&plan);
  }

  print_info("Installation target");
  print_stat("Package", &plan.target.package_dir().display().to_string());
  print_stat("Executables", &plan.target.bin_dir().display().to_string());
  print_stat("Interpreter", &plan.interpreter.display().to_string());

  println!();
  print_info(&format!("Install {} executable(s)", plan.binaries.len()));
  for source in &plan.binaries {
    let name = source.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    print_mapping(
      &source.display().to_string(),
      &plan.target.bin_dir().join(name).display().to_string(),
    );
  }

  println!();
  print_info("Run build");
  print_stat("Command", &plan.invocation.display_command());
  print_stat("Directory", &plan.invocation.working_dir.display().to_string());
  print_stat(
    "Environment",
    &format!("{}={}", config.interpreter_var, plan.interpreter.display()),
  );
  print_stat("Log", &plan.invocation.log_file.display().to_string());

  println!();
  print_info(&format!("Stage {} artifact(s)", plan.artifacts.len()));
  for artifact in &plan.artifacts {
    print_mapping(
      &format!("{} ({})", artifact.source.display(), artifact.kind),
      &artifact.destination.display().to_string(),
    );
  }

  println!();
  print_info(&format!("Clean {} intermediate path(s)", plan.cleanup.len()));
  for path in &plan.cleanup {
    println!("    {}", path.display());
  }

  Ok(())
}
