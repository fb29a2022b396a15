//! Pipeline runner.
//!
//! Launches the build script with its combined output appended to the log
//! file and waits for it, however long it takes.

use std::fs::{File, OpenOptions};
use std::process::Stdio;
use std::time::Instant;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::PipelineError;

use super::types::{BuildInvocation, BuildResult};

/// Run the build described by `invocation` to completion.
///
/// Returns `Ok` for any build that was launched and terminated, whatever its
/// exit status; use [`BuildResult::check`] to require success. Fails with
/// [`PipelineError::BuildLaunch`] when the process could not be started, and
/// with [`PipelineError::BuildExecution`] when it started but could not be
/// waited on.
pub async fn run_build(invocation: &BuildInvocation) -> Result<BuildResult, PipelineError> {
  info!(
    cmd = %invocation.display_command(),
    working_dir = %invocation.working_dir.display(),
    log = %invocation.log_file.display(),
    "running build, this can take several minutes"
  );

  let started = Instant::now();
  let mut child = spawn(invocation)?;

  let status = child.wait().await.map_err(|e| lost_build(invocation, &e))?;

  let exit_code = status.code();
  let elapsed = started.elapsed();

  if status.success() {
    info!(elapsed_secs = elapsed.as_secs(), "build finished");
  } else {
    match exit_code {
      Some(code) => warn!(code, elapsed_secs = elapsed.as_secs(), "build failed"),
      None => warn!(signal = ?termination_signal(&status), "build terminated by signal"),
    }
  }

  Ok(BuildResult {
    exit_code,
    log_file: invocation.log_file.clone(),
  })
}

/// The build was started but its exit status could not be collected.
fn lost_build(invocation: &BuildInvocation, error: &std::io::Error) -> PipelineError {
  warn!(error = %error, log = %invocation.log_file.display(), "lost track of build process");
  PipelineError::BuildExecution {
    exit_code: None,
    log_file: invocation.log_file.clone(),
  }
}

/// Start the child with both output streams on the log file.
///
/// The parent's log handles live only inside this function, so they are
/// closed whether or not the spawn succeeds.
fn spawn(invocation: &BuildInvocation) -> Result<Child, PipelineError> {
  let launch_error = |message: String| PipelineError::BuildLaunch {
    command: invocation.display_command(),
    working_dir: invocation.working_dir.clone(),
    message,
  };

  let Some((program, args)) = invocation.command.split_first() else {
    return Err(launch_error("empty command".to_string()));
  };

  if !invocation.working_dir.is_dir() {
    return Err(launch_error("working directory does not exist".to_string()));
  }
  if !invocation.script.is_file() {
    return Err(launch_error(format!(
      "build script {} does not exist",
      invocation.script.display()
    )));
  }

  let stdout = open_log(invocation).map_err(|e| {
    launch_error(format!(
      "cannot open log file {}: {}",
      invocation.log_file.display(),
      e
    ))
  })?;
  let stderr = stdout
    .try_clone()
    .map_err(|e| launch_error(format!("cannot share log file handle: {}", e)))?;

  let mut command = Command::new(program);
  command
    .args(args)
    .current_dir(&invocation.working_dir)
    .env_clear()
    .envs(&invocation.environment)
    .stdin(Stdio::null())
    .stdout(Stdio::from(stdout))
    .stderr(Stdio::from(stderr));

  debug!(program = %program, working_dir = ?invocation.working_dir, "spawning build process");

  command.spawn().map_err(|e| launch_error(e.to_string()))
}

fn open_log(invocation: &BuildInvocation) -> std::io::Result<File> {
  if let Some(parent) = invocation.log_file.parent() {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent)?;
    }
  }
  OpenOptions::new().create(true).append(true).open(&invocation.log_file)
}

#[cfg(unix)]
fn termination_signal(status: &std::process::ExitStatus) -> Option<i32> {
  use std::os::unix::process::ExitStatusExt;
  status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: &std::process::ExitStatus) -> Option<i32> {
  None
}
