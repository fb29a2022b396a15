//! Implementation of the `stagehand run` command.
//!
//! Runs the whole pipeline. Exits non-zero when any fatal step fails;
//! cleanup problems are printed as warnings and leave the exit status alone.

use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use stagehand_lib::PipelineError;
use stagehand_lib::config::StageConfig;
use stagehand_lib::pipeline::{PipelineOptions, PipelineReport, run_pipeline};

use crate::output::{
  OutputFormat, format_bytes, format_duration, print_error, print_info, print_json, print_stat, print_success,
  print_warning,
};

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RunOutput<'a> {
  Done {
    #[serde(flatten)]
    report: &'a PipelineReport,
  },
  Abort {
    step: &'static str,
    error: String,
    log_file: Option<&'a std::path::Path>,
  },
}

pub fn cmd_run(config: &StageConfig, options: &PipelineOptions, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  // The build is one long blocking wait; a single thread is enough.
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;

  match rt.block_on(run_pipeline(config, options)) {
    Ok(report) => {
      if output.is_json() {
        print_json(&RunOutput::Done { report: &report })?;
      } else {
        print_report(&report, start);
      }
      info!(path = %report.build.log_file.display(), "build log kept");
      Ok(())
    }
    Err(err) => {
      if output.is_json() {
        print_json(&RunOutput::Abort {
          step: err.step(),
          error: err.to_string(),
          log_file: err.log_file().map(|p| p.as_path()),
        })?;
      } else {
        print_failure(&err);
      }
      std::process::exit(1);
    }
  }
}

fn print_report(report: &PipelineReport, start: Instant) {
  println!();
  print_success("Install complete!");
  print_stat("Package", &report.target.package_dir().display().to_string());
  print_stat("Executables installed", &report.binaries.len().to_string());
  print_stat("Artifacts staged", &report.staged.len().to_string());
  print_stat("Build log", &report.build.log_file.display().to_string());
  print_stat("Intermediates removed", &report.cleanup.removed().to_string());
  print_stat("Space freed", &format_bytes(report.cleanup.bytes_freed()));
  print_stat("Duration", &format_duration(start.elapsed()));

  for outcome in report.cleanup.warnings() {
    print_warning(&format!(
      "Could not remove {}: {}",
      outcome.path.display(),
      outcome.failure().unwrap_or_default()
    ));
  }
}

fn print_failure(err: &PipelineError) {
  print_error(&format!("Install aborted during {}: {}", err.step(), err));

  if let Some(log) = err.log_file() {
    print_info(&format!("Full build output: {}", log.display()));
  }
  if matches!(err, PipelineError::Staging { .. }) {
    print_info("Executables were already installed; re-run once the cause is fixed.");
  }
}
