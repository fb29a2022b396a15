//! Build invocation and result types.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::StageConfig;
use crate::error::PipelineError;

/// Exactly one run of the external build script.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInvocation {
  /// Program followed by its arguments.
  pub command: Vec<String>,
  pub working_dir: PathBuf,
  /// The complete child environment. The child sees nothing else.
  #[serde(skip)]
  pub environment: BTreeMap<OsString, OsString>,
  /// Script the command runs; must exist before launch.
  pub script: PathBuf,
  pub log_file: PathBuf,
}

impl BuildInvocation {
  /// Describe the configured build, inheriting the current environment.
  pub fn new(config: &StageConfig, source_root: &Path, interpreter: &Path) -> Self {
    Self::with_base_env(config, source_root, interpreter, ambient_env())
  }

  /// Describe the configured build on top of `base` instead of the current
  /// environment. The interpreter variable always overrides `base`.
  pub fn with_base_env(
    config: &StageConfig,
    source_root: &Path,
    interpreter: &Path,
    base: impl IntoIterator<Item = (OsString, OsString)>,
  ) -> Self {
    let working_dir = config.workspace_dir(source_root);

    let mut environment: BTreeMap<OsString, OsString> = base.into_iter().collect();
    environment.insert(
      OsString::from(&config.interpreter_var),
      interpreter.as_os_str().to_os_string(),
    );

    Self {
      command: vec![config.shell.clone(), config.build_script.clone()],
      script: working_dir.join(&config.build_script),
      working_dir,
      environment,
      log_file: config.log_path(source_root),
    }
  }

  /// The command as a single shell-like string, for messages.
  pub fn display_command(&self) -> String {
    self.command.join(" ")
  }
}

/// Copy of the current process environment, byte for byte.
fn ambient_env() -> BTreeMap<OsString, OsString> {
  std::env::vars_os().collect()
}

/// Outcome of a build that was launched and ran to termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
  /// `None` when the process was terminated by a signal.
  pub exit_code: Option<i32>,
  pub log_file: PathBuf,
}

impl BuildResult {
  pub fn is_success(&self) -> bool {
    self.exit_code == Some(0)
  }

  /// Promote to a [`SuccessfulBuild`], or fail with the log location.
  pub fn check(self) -> Result<SuccessfulBuild, PipelineError> {
    if self.is_success() {
      Ok(SuccessfulBuild(self))
    } else {
      Err(PipelineError::BuildExecution {
        exit_code: self.exit_code,
        log_file: self.log_file,
      })
    }
  }
}

/// A build that exited with status 0. Staging requires one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SuccessfulBuild(BuildResult);

impl SuccessfulBuild {
  pub fn log_file(&self) -> &Path {
    &self.0.log_file
  }

  pub fn result(&self) -> &BuildResult {
    &self.0
  }
}
