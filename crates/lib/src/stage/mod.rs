//! Artifact stager.
//!
//! Moves the build's outputs into the installed package. Each artifact is
//! replaced as a unit: new content is assembled in a hidden sibling of the
//! destination and renamed into place only once complete, so a destination
//! holds either its previous content or the new content, never a mix.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::build::SuccessfulBuild;
use crate::config::StageConfig;
use crate::error::PipelineError;
use crate::platform::InstallationTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
  File,
  Directory,
}

impl fmt::Display for ArtifactKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::File => write!(f, "file"),
      Self::Directory => write!(f, "directory"),
    }
  }
}

/// One copy from the build workspace into the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedArtifact {
  pub source: PathBuf,
  pub destination: PathBuf,
  pub kind: ArtifactKind,
}

/// The artifacts the configured build produces, in staging order: the data
/// module first, then the model directory.
pub fn artifacts_for(config: &StageConfig, source_root: &Path, target: &InstallationTarget) -> Vec<StagedArtifact> {
  let workspace = config.workspace_dir(source_root);
  let module_name = config.data_module.file_name().unwrap_or(config.data_module.as_os_str());
  let models_name = config.models.file_name().unwrap_or(config.models.as_os_str());

  vec![
    StagedArtifact {
      source: workspace.join(&config.data_module),
      destination: target.package_dir().join(module_name),
      kind: ArtifactKind::File,
    },
    StagedArtifact {
      source: workspace.join(&config.models),
      destination: target.package_dir().join(&config.data_dir_name).join(models_name),
      kind: ArtifactKind::Directory,
    },
  ]
}

/// Stage `artifacts` in order, stopping at the first failure.
///
/// Requires a [`SuccessfulBuild`]; a failed build never reaches this point.
pub fn stage_artifacts(artifacts: &[StagedArtifact], build: &SuccessfulBuild) -> Result<Vec<PathBuf>, PipelineError> {
  debug!(log = %build.log_file().display(), count = artifacts.len(), "staging build outputs");

  let mut staged = Vec::with_capacity(artifacts.len());

  for artifact in artifacts {
    let result = match artifact.kind {
      ArtifactKind::File => stage_file(&artifact.source, &artifact.destination),
      ArtifactKind::Directory => stage_directory(&artifact.source, &artifact.destination),
    };

    result.map_err(|message| PipelineError::Staging {
      kind: artifact.kind,
      source_path: artifact.source.clone(),
      destination: artifact.destination.clone(),
      message,
    })?;

    info!(kind = %artifact.kind, path = %artifact.destination.display(), "staged");
    staged.push(artifact.destination.clone());
  }

  Ok(staged)
}

fn stage_file(source: &Path, destination: &Path) -> Result<(), String> {
  if !source.is_file() {
    return Err("source file does not exist".to_string());
  }
  let parent = ensure_parent(destination)?;

  let temp = NamedTempFile::new_in(parent).map_err(|e| format!("cannot create temporary file: {}", e))?;
  fs::copy(source, temp.path()).map_err(|e| format!("copy failed: {}", e))?;
  temp
    .persist(destination)
    .map_err(|e| format!("cannot replace destination: {}", e.error))?;

  Ok(())
}

fn stage_directory(source: &Path, destination: &Path) -> Result<(), String> {
  if !source.is_dir() {
    return Err("source directory does not exist".to_string());
  }
  let parent = ensure_parent(destination)?;
  let name = destination
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .ok_or_else(|| "destination has no directory name".to_string())?;

  // Dropped (and removed) on any early return below.
  let staging = tempfile::Builder::new()
    .prefix(&format!(".{}.new-", name))
    .tempdir_in(parent)
    .map_err(|e| format!("cannot create staging directory: {}", e))?;

  copy_tree(source, staging.path()).map_err(|e| format!("copy failed: {}", e))?;
  sweep_stale_backups(parent, &name);

  if !destination.exists() {
    return fs::rename(staging.path(), destination).map_err(|e| format!("cannot move new tree into place: {}", e));
  }

  let backup = parent.join(format!(".{}.old-{}", name, std::process::id()));
  if backup.exists() {
    return Err(format!("cannot clear stale backup {}", backup.display()));
  }

  fs::rename(destination, &backup).map_err(|e| format!("cannot move previous tree aside: {}", e))?;

  if let Err(e) = fs::rename(staging.path(), destination) {
    if let Err(restore) = fs::rename(&backup, destination) {
      return Err(format!(
        "cannot move new tree into place ({}); previous tree left at {} ({})",
        e,
        backup.display(),
        restore
      ));
    }
    return Err(format!("cannot move new tree into place: {}", e));
  }

  debug!(path = %backup.display(), "removing previous tree");
  if let Err(e) = remove_path(&backup) {
    warn!(path = %backup.display(), error = %e, "failed to remove previous tree");
  }

  Ok(())
}

/// Remove backups left by runs that died between the two renames.
fn sweep_stale_backups(parent: &Path, name: &str) {
  let prefix = format!(".{}.old-", name);
  let Ok(entries) = fs::read_dir(parent) else {
    return;
  };

  for entry in entries.filter_map(|e| e.ok()) {
    if !entry.file_name().to_string_lossy().starts_with(&prefix) {
      continue;
    }
    let path = entry.path();
    debug!(path = %path.display(), "removing stale backup");
    if let Err(e) = remove_path(&path) {
      warn!(path = %path.display(), error = %e, "failed to remove stale backup");
    }
  }
}

fn ensure_parent(destination: &Path) -> Result<&Path, String> {
  let parent = destination
    .parent()
    .ok_or_else(|| "destination has no parent directory".to_string())?;
  fs::create_dir_all(parent).map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
  Ok(parent)
}

/// Recursively copy the contents of `source` into the existing `destination`.
/// Symlinks are followed and their targets copied.
fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
  for entry in WalkDir::new(source).follow_links(true).min_depth(1) {
    let entry = entry.map_err(io::Error::other)?;
    let rel = entry.path().strip_prefix(source).map_err(io::Error::other)?;
    let target = destination.join(rel);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else {
      fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}

fn remove_path(path: &Path) -> io::Result<()> {
  if path.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  }
}
