//! Binary installer.
//!
//! Copies the companion executables shipped in the source tree into the
//! executable directory of the environment the package was installed into.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::PipelineError;

/// Copy each of `sources` into `bin_dir`, replacing files of the same name.
///
/// Stops at the first failure. Returns the installed paths in order.
pub fn install_binaries(sources: &[PathBuf], bin_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
  let mut installed = Vec::with_capacity(sources.len());

  for source in sources {
    let destination = install_one(source, bin_dir)?;
    info!(path = %destination.display(), "installed executable");
    installed.push(destination);
  }

  Ok(installed)
}

fn install_one(source: &Path, bin_dir: &Path) -> Result<PathBuf, PipelineError> {
  let Some(name) = source.file_name() else {
    return Err(PipelineError::BinaryInstall {
      source_path: source.to_path_buf(),
      destination: bin_dir.to_path_buf(),
      source: io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
    });
  };
  let destination = bin_dir.join(name);
  let fail = |source_err: io::Error| PipelineError::BinaryInstall {
    source_path: source.to_path_buf(),
    destination: destination.clone(),
    source: source_err,
  };

  debug!(from = %source.display(), to = %destination.display(), "copying executable");

  if !source.is_file() {
    return Err(fail(io::Error::new(io::ErrorKind::NotFound, "source executable not found")));
  }

  fs::create_dir_all(bin_dir).map_err(fail)?;

  // Write next to the destination and rename over it, so a running copy of
  // the old executable is never truncated in place.
  let temp = NamedTempFile::new_in(bin_dir).map_err(fail)?;
  fs::copy(source, temp.path()).map_err(fail)?;
  make_executable(temp.path()).map_err(fail)?;
  temp.persist(&destination).map_err(|e| fail(e.error))?;

  Ok(destination)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
  Ok(())
}
