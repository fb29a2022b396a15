//! Artifact locator.
//!
//! Resolves the installed package directory and the executable directory.
//! Each field is taken from, in order: an explicit option, a `STAGEHAND_*`
//! environment variable, then the interpreter the package was installed with.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

use crate::consts::{BIN_DIR_ENV, DEFAULT_PYTHON, PACKAGE_DIR_ENV, PYTHON_ENV, SITE_PACKAGES_ENV};
use crate::error::PipelineError;

/// Where the installed package and its companion executables live.
///
/// Resolved once per run and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallationTarget {
  package_dir: PathBuf,
  bin_dir: PathBuf,
}

impl InstallationTarget {
  pub fn new(package_dir: PathBuf, bin_dir: PathBuf) -> Self {
    Self { package_dir, bin_dir }
  }

  pub fn package_dir(&self) -> &Path {
    &self.package_dir
  }

  pub fn bin_dir(&self) -> &Path {
    &self.bin_dir
  }
}

/// Explicit overrides, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct LocateOptions {
  pub package_dir: Option<PathBuf>,
  pub site_packages: Option<PathBuf>,
  pub bin_dir: Option<PathBuf>,
  pub python: Option<PathBuf>,
}

/// The interpreter running the install.
///
/// Bare names are looked up on `PATH`; if that fails the name is returned
/// unchanged and whoever launches it reports the failure.
pub fn resolve_interpreter(options: &LocateOptions) -> PathBuf {
  let python = options
    .python
    .clone()
    .or_else(|| env_path(PYTHON_ENV))
    .unwrap_or_else(|| PathBuf::from(DEFAULT_PYTHON));

  if python.components().count() > 1 || python.is_absolute() {
    return python;
  }

  find_on_path(&python).unwrap_or(python)
}

/// Resolve the installation target for `package_name`.
pub fn locate(package_name: &str, options: &LocateOptions) -> Result<InstallationTarget, PipelineError> {
  let interpreter = resolve_interpreter(options);

  let package_dir = match options.package_dir.clone().or_else(|| env_path(PACKAGE_DIR_ENV)) {
    Some(dir) => dir,
    None => {
      let site_packages = match options.site_packages.clone().or_else(|| env_path(SITE_PACKAGES_ENV)) {
        Some(dir) => dir,
        None => query_site_packages(&interpreter)?,
      };
      site_packages.join(package_name)
    }
  };

  if !package_dir.is_dir() {
    return Err(PipelineError::EnvironmentResolution(format!(
      "package directory {} does not exist; is {} installed?",
      package_dir.display(),
      package_name
    )));
  }
  let package_dir = dunce::canonicalize(&package_dir).map_err(|e| {
    PipelineError::EnvironmentResolution(format!("cannot resolve {}: {}", package_dir.display(), e))
  })?;

  let bin_dir = match options.bin_dir.clone().or_else(|| env_path(BIN_DIR_ENV)) {
    Some(dir) => dir,
    None => interpreter_bin_dir(&interpreter)?,
  };

  info!(package_dir = %package_dir.display(), bin_dir = %bin_dir.display(), "resolved installation target");

  Ok(InstallationTarget { package_dir, bin_dir })
}

/// Ask the interpreter for its first site-packages directory.
fn query_site_packages(interpreter: &Path) -> Result<PathBuf, PipelineError> {
  debug!(interpreter = %interpreter.display(), "querying site-packages");

  let output = Command::new(interpreter)
    .args(["-c", "import site; print(site.getsitepackages()[0])"])
    .output()
    .map_err(|e| {
      PipelineError::EnvironmentResolution(format!(
        "cannot run interpreter {}: {}",
        interpreter.display(),
        e
      ))
    })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(PipelineError::EnvironmentResolution(format!(
      "interpreter {} failed to report site-packages: {}",
      interpreter.display(),
      stderr.trim()
    )));
  }

  let stdout = String::from_utf8_lossy(&output.stdout);
  match stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
    Some(line) => Ok(PathBuf::from(line)),
    None => Err(PipelineError::EnvironmentResolution(format!(
      "interpreter {} reported no site-packages directory",
      interpreter.display()
    ))),
  }
}

/// The directory holding the interpreter executable.
fn interpreter_bin_dir(interpreter: &Path) -> Result<PathBuf, PipelineError> {
  if !interpreter.is_absolute() {
    return Err(PipelineError::EnvironmentResolution(format!(
      "interpreter {} not found on PATH; pass --bin-dir",
      interpreter.display()
    )));
  }

  interpreter
    .parent()
    .map(Path::to_path_buf)
    .ok_or_else(|| {
      PipelineError::EnvironmentResolution(format!(
        "interpreter {} has no parent directory",
        interpreter.display()
      ))
    })
}

fn env_path(var: &str) -> Option<PathBuf> {
  std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn find_on_path(name: &Path) -> Option<PathBuf> {
  let path: OsString = std::env::var_os("PATH")?;
  std::env::split_paths(&path)
    .map(|dir| dir.join(name))
    .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}
