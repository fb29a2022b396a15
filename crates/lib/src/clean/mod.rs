//! Workspace cleaner.
//!
//! Removes the build's intermediate directories once staging is done. Every
//! path is attempted; a failure is logged as a warning and recorded, never
//! returned as an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CleanupStatus {
  Removed { bytes_freed: u64 },
  /// Nothing existed at the path.
  Absent,
  Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupOutcome {
  pub path: PathBuf,
  #[serde(flatten)]
  pub status: CleanupStatus,
}

impl CleanupOutcome {
  pub fn failure(&self) -> Option<&str> {
    match &self.status {
      CleanupStatus::Failed { message } => Some(message),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
  pub outcomes: Vec<CleanupOutcome>,
}

impl CleanupReport {
  pub fn removed(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|o| matches!(o.status, CleanupStatus::Removed { .. }))
      .count()
  }

  pub fn bytes_freed(&self) -> u64 {
    self
      .outcomes
      .iter()
      .map(|o| match o.status {
        CleanupStatus::Removed { bytes_freed } => bytes_freed,
        _ => 0,
      })
      .sum()
  }

  /// Outcomes that should be surfaced to the operator as warnings.
  pub fn warnings(&self) -> impl Iterator<Item = &CleanupOutcome> {
    self
      .outcomes
      .iter()
      .filter(|o| o.failure().is_some())
  }

  pub fn has_warnings(&self) -> bool {
    self.warnings().next().is_some()
  }
}

/// Recursively delete each of `targets`, independently and in order.
pub fn clean_workspace(targets: &[PathBuf]) -> CleanupReport {
  let outcomes: Vec<CleanupOutcome> = targets
    .iter()
    .map(|path| CleanupOutcome {
      path: path.clone(),
      status: remove_target(path),
    })
    .collect();

  let report = CleanupReport { outcomes };

  for outcome in report.warnings() {
    warn!(
      path = %outcome.path.display(),
      error = outcome.failure().unwrap_or_default(),
      "could not remove intermediate build files"
    );
  }

  info!(
    removed = report.removed(),
    bytes_freed = report.bytes_freed(),
    "workspace cleanup complete"
  );

  report
}

fn remove_target(path: &Path) -> CleanupStatus {
  let metadata = match fs::symlink_metadata(path) {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      debug!(path = %path.display(), "nothing to clean");
      return CleanupStatus::Absent;
    }
    Err(e) => return CleanupStatus::Failed { message: e.to_string() },
  };

  let size = if metadata.is_dir() { dir_size(path) } else { metadata.len() };

  let result = if metadata.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  };

  match result {
    Ok(()) => {
      debug!(path = %path.display(), bytes = size, "removed");
      CleanupStatus::Removed { bytes_freed: size }
    }
    Err(e) => CleanupStatus::Failed { message: e.to_string() },
  }
}

fn dir_size(path: &Path) -> u64 {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .map(|m| m.len())
    .sum()
}
