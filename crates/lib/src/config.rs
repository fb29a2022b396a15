//! Pipeline configuration.
//!
//! Every path and name the pipeline touches lives in [`StageConfig`]. The
//! defaults reproduce the layout of the `anarci` source tree:
//!
//! ```text
//! <source_root>/
//! ├── bin/ANARCI, bin/muscle, bin/muscle_macOS   # companion executables
//! ├── build_pipeline.log                          # build log (kept)
//! └── build_pipeline/                             # workspace
//!     ├── RUN_pipeline.sh
//!     ├── curated_alignments/germlines.py         # generated data module
//!     ├── HMMs/                                   # generated models
//!     ├── muscle_alignments/
//!     └── IMGT_sequence_files/
//! ```
//!
//! Relative paths are resolved against the source root (binaries, workspace,
//! log file) or against the workspace (build outputs, cleanup targets).

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::INTERPRETER_VAR;
use crate::platform::os::Os;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid config: {0}")]
  Invalid(String),
}

/// A companion executable shipped in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinarySpec {
  /// Path relative to the source root.
  pub source: PathBuf,
  /// Restrict installation to one operating system.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub os: Option<Os>,
}

impl BinarySpec {
  pub fn any(source: impl Into<PathBuf>) -> Self {
    Self {
      source: source.into(),
      os: None,
    }
  }

  pub fn only(source: impl Into<PathBuf>, os: Os) -> Self {
    Self {
      source: source.into(),
      os: Some(os),
    }
  }

  /// Whether this binary should be installed on `os`.
  pub fn applies_to(&self, os: Option<Os>) -> bool {
    match self.os {
      None => true,
      Some(wanted) => os == Some(wanted),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
  /// Name of the installed package directory under site-packages.
  pub package_name: String,
  /// Installed package directory, skipping site-packages lookup.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub package_dir: Option<PathBuf>,
  /// Build workspace, relative to the source root.
  pub workspace: PathBuf,
  /// Script run inside the workspace.
  pub build_script: String,
  /// Shell used to run the script.
  pub shell: String,
  /// Build log, relative to the source root.
  pub log_file: PathBuf,
  /// Variable carrying the interpreter path into the build.
  pub interpreter_var: String,
  pub binaries: Vec<BinarySpec>,
  /// Generated data module, relative to the workspace.
  pub data_module: PathBuf,
  /// Generated model directory, relative to the workspace.
  pub models: PathBuf,
  /// Subdirectory of the package that receives the model directory.
  pub data_dir_name: String,
  /// Intermediate directories removed after staging, relative to the workspace.
  pub cleanup: Vec<PathBuf>,
}

impl Default for StageConfig {
  fn default() -> Self {
    Self {
      package_name: "anarci".to_string(),
      package_dir: None,
      workspace: PathBuf::from("build_pipeline"),
      build_script: "RUN_pipeline.sh".to_string(),
      shell: "bash".to_string(),
      log_file: PathBuf::from("build_pipeline.log"),
      interpreter_var: INTERPRETER_VAR.to_string(),
      binaries: vec![
        BinarySpec::any("bin/ANARCI"),
        BinarySpec::only("bin/muscle", Os::Linux),
        BinarySpec::only("bin/muscle_macOS", Os::MacOs),
      ],
      data_module: PathBuf::from("curated_alignments/germlines.py"),
      models: PathBuf::from("HMMs"),
      data_dir_name: "dat".to_string(),
      cleanup: vec![
        PathBuf::from("curated_alignments"),
        PathBuf::from("muscle_alignments"),
        PathBuf::from("IMGT_sequence_files"),
      ],
    }
  }
}

impl StageConfig {
  /// Load a config file. Fields missing from the file keep their defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    config.validate()?;
    Ok(config)
  }

  /// Load `path` if given, otherwise the defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::load(path),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.package_name.is_empty() {
      return Err(ConfigError::Invalid("package_name is empty".to_string()));
    }
    if self.build_script.is_empty() || self.shell.is_empty() {
      return Err(ConfigError::Invalid("build_script and shell must be set".to_string()));
    }
    if self.interpreter_var.is_empty() {
      return Err(ConfigError::Invalid("interpreter_var is empty".to_string()));
    }
    if self.data_module.file_name().is_none() {
      return Err(ConfigError::Invalid(format!(
        "data_module has no file name: {}",
        self.data_module.display()
      )));
    }
    if self.models.file_name().is_none() {
      return Err(ConfigError::Invalid(format!(
        "models has no directory name: {}",
        self.models.display()
      )));
    }
    if !is_plain_relative(Path::new(&self.data_dir_name)) {
      return Err(ConfigError::Invalid(format!(
        "data_dir_name must be a relative path: {}",
        self.data_dir_name
      )));
    }

    for target in &self.cleanup {
      if !is_plain_relative(target) {
        return Err(ConfigError::Invalid(format!(
          "cleanup target must stay inside the workspace: {}",
          target.display()
        )));
      }
    }

    Ok(())
  }

  pub fn workspace_dir(&self, source_root: &Path) -> PathBuf {
    source_root.join(&self.workspace)
  }

  pub fn log_path(&self, source_root: &Path) -> PathBuf {
    source_root.join(&self.log_file)
  }

  /// Source paths of the binaries that apply to `os`, in declaration order.
  pub fn binaries_for(&self, os: Option<Os>, source_root: &Path) -> Vec<PathBuf> {
    self
      .binaries
      .iter()
      .filter(|b| b.applies_to(os))
      .map(|b| source_root.join(&b.source))
      .collect()
  }

  pub fn cleanup_targets(&self, source_root: &Path) -> Vec<PathBuf> {
    let workspace = self.workspace_dir(source_root);
    self.cleanup.iter().map(|p| workspace.join(p)).collect()
  }
}

/// Relative, with no `..` or root components.
fn is_plain_relative(path: &Path) -> bool {
  !path.as_os_str().is_empty() && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
