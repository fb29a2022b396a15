//! Implementation of the `stagehand clean` command.

use anyhow::Result;

use stagehand_lib::config::StageConfig;
use stagehand_lib::pipeline::{PipelineOptions, clean_only};

use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_success, print_warning};

/// Remove the configured intermediate directories.
///
/// Always succeeds; paths that could not be removed are reported as warnings.
pub fn cmd_clean(config: &StageConfig, options: &PipelineOptions, output: OutputFormat) -> Result<()> {
  let report = clean_only(config, &options.source_root);

  if output.is_json() {
    return print_json(&report);
  }

  println!();
  print_success("Workspace cleanup complete!");
  print_stat("Removed", &report.removed().to_string());
  print_stat("Space freed", &format_bytes(report.bytes_freed()));

  for outcome in report.warnings() {
    print_warning(&format!(
      "Could not remove {}: {}",
      outcome.path.display(),
      outcome.failure().unwrap_or_default()
    ));
  }

  Ok(())
}
