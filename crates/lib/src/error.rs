//! Fatal pipeline errors.
//!
//! Each variant names the step that failed and the paths involved so an
//! operator can recover by hand. Cleanup problems are not errors; they are
//! reported as [`crate::clean::CleanupOutcome`] records.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::stage::ArtifactKind;

#[derive(Debug, Error)]
pub enum PipelineError {
  /// The package or executable directory could not be determined.
  #[error("could not resolve installation target: {0}")]
  EnvironmentResolution(String),

  /// A companion executable could not be placed.
  #[error("failed to install {} to {}: {source}", source_path.display(), destination.display())]
  BinaryInstall {
    source_path: PathBuf,
    destination: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The build subprocess could not be started.
  #[error("failed to launch `{command}` in {}: {message}", working_dir.display())]
  BuildLaunch {
    command: String,
    working_dir: PathBuf,
    message: String,
  },

  /// The build subprocess ran and did not exit with status 0.
  #[error("build {}; see log at {}", describe_exit(*exit_code), log_file.display())]
  BuildExecution {
    exit_code: Option<i32>,
    log_file: PathBuf,
  },

  /// A generated artifact could not be placed.
  #[error("failed to stage {kind} {} to {}: {message}", source_path.display(), destination.display())]
  Staging {
    kind: ArtifactKind,
    source_path: PathBuf,
    destination: PathBuf,
    message: String,
  },
}

impl PipelineError {
  /// Short name of the pipeline step this error aborted.
  pub fn step(&self) -> &'static str {
    match self {
      Self::EnvironmentResolution(_) => "locate",
      Self::BinaryInstall { .. } => "install-binaries",
      Self::BuildLaunch { .. } | Self::BuildExecution { .. } => "build",
      Self::Staging { .. } => "stage",
    }
  }

  /// Build log to point the operator at, if one exists for this failure.
  pub fn log_file(&self) -> Option<&PathBuf> {
    match self {
      Self::BuildExecution { log_file, .. } => Some(log_file),
      _ => None,
    }
  }
}

fn describe_exit(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("exited with status {}", code),
    None => "was terminated by a signal".to_string(),
  }
}
