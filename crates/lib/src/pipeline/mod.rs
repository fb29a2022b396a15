//! Pipeline orchestration.
//!
//! A single forward pass, each step waiting for the previous one:
//!
//! ```text
//! Start → LocateTargets → InstallBinaries → RunBuild → StageArtifacts → CleanWorkspace → Done
//!                 │               │              │             │
//!                 └───────────────┴──────────────┴─────────────┴──→ Abort
//! ```
//!
//! There is no retry edge. Cleanup only runs after staging succeeded, and
//! its failures never abort the run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::build::{BuildInvocation, BuildResult, run_build};
use crate::clean::{CleanupReport, clean_workspace};
use crate::config::StageConfig;
use crate::error::PipelineError;
use crate::install::install_binaries;
use crate::platform::{InstallationTarget, LocateOptions, Os, locate, resolve_interpreter};
use crate::stage::{StagedArtifact, artifacts_for, stage_artifacts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineState {
  Start,
  LocateTargets,
  InstallBinaries,
  RunBuild,
  StageArtifacts,
  CleanWorkspace,
  Done,
  Abort,
}

impl fmt::Display for PipelineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Start => "start",
      Self::LocateTargets => "locate-targets",
      Self::InstallBinaries => "install-binaries",
      Self::RunBuild => "run-build",
      Self::StageArtifacts => "stage-artifacts",
      Self::CleanWorkspace => "clean-workspace",
      Self::Done => "done",
      Self::Abort => "abort",
    };
    f.write_str(name)
  }
}

/// Inputs that come from the invocation rather than the config.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
  /// Root of the package source tree the install hook runs from.
  pub source_root: PathBuf,
  pub locate: LocateOptions,
  /// Operating system used to select companion binaries.
  pub os: Option<Os>,
}

impl PipelineOptions {
  pub fn new(source_root: impl Into<PathBuf>) -> Self {
    Self {
      source_root: source_root.into(),
      locate: LocateOptions::default(),
      os: Os::current(),
    }
  }
}

/// Everything the pipeline will do, resolved but not executed.
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
  pub target: InstallationTarget,
  pub interpreter: PathBuf,
  pub binaries: Vec<PathBuf>,
  pub invocation: BuildInvocation,
  pub artifacts: Vec<StagedArtifact>,
  pub cleanup: Vec<PathBuf>,
}

/// Outcome of a run that reached `Done`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
  pub target: InstallationTarget,
  pub binaries: Vec<PathBuf>,
  pub build: BuildResult,
  pub staged: Vec<PathBuf>,
  pub cleanup: CleanupReport,
}

/// Resolve the installation target and describe every step.
///
/// Only reads the environment; nothing is written.
pub fn plan(config: &StageConfig, options: &PipelineOptions) -> Result<PipelinePlan, PipelineError> {
  let target = locate(&config.package_name, &options.locate)?;
  Ok(plan_for_target(config, options, target))
}

fn plan_for_target(config: &StageConfig, options: &PipelineOptions, target: InstallationTarget) -> PipelinePlan {
  let root = &options.source_root;
  let interpreter = resolve_interpreter(&options.locate);

  PipelinePlan {
    binaries: config.binaries_for(options.os, root),
    invocation: BuildInvocation::new(config, root, &interpreter),
    artifacts: artifacts_for(config, root, &target),
    cleanup: config.cleanup_targets(root),
    interpreter,
    target,
  }
}

/// Run the whole pipeline.
pub async fn run_pipeline(config: &StageConfig, options: &PipelineOptions) -> Result<PipelineReport, PipelineError> {
  let mut state = PipelineState::Start;

  let result = drive(config, options, &mut state).await;

  match &result {
    Ok(_) => info!("install finished"),
    Err(e) => {
      error!(step = %state, error = %e, "install aborted");
      transition(&mut state, PipelineState::Abort);
    }
  }

  result
}

async fn drive(
  config: &StageConfig,
  options: &PipelineOptions,
  state: &mut PipelineState,
) -> Result<PipelineReport, PipelineError> {
  transition(state, PipelineState::LocateTargets);
  let plan = plan(config, options)?;
  info!(path = %plan.target.package_dir().display(), "package lives in");

  transition(state, PipelineState::InstallBinaries);
  let binaries = install_binaries(&plan.binaries, plan.target.bin_dir())?;

  transition(state, PipelineState::RunBuild);
  let build = run_build(&plan.invocation).await?.check()?;

  transition(state, PipelineState::StageArtifacts);
  let staged = match stage_artifacts(&plan.artifacts, &build) {
    Ok(staged) => staged,
    Err(e) => {
      report_partial_install(&binaries, build.log_file());
      return Err(e);
    }
  };

  transition(state, PipelineState::CleanWorkspace);
  let cleanup = clean_workspace(&plan.cleanup);

  transition(state, PipelineState::Done);

  Ok(PipelineReport {
    target: plan.target,
    binaries,
    build: build.result().clone(),
    staged,
    cleanup,
  })
}

fn transition(state: &mut PipelineState, next: PipelineState) {
  debug!(from = %state, to = %next, "pipeline state");
  *state = next;
}

/// Earlier steps changed the system before staging failed; say what stays.
fn report_partial_install(binaries: &[PathBuf], log_file: &Path) {
  for path in binaries {
    error!(path = %path.display(), "already installed executable remains in place");
  }
  error!(log = %log_file.display(), "build completed; its outputs are still in the workspace");
}

/// Run only the workspace cleaner for the configured targets.
pub fn clean_only(config: &StageConfig, source_root: &Path) -> CleanupReport {
  clean_workspace(&config.cleanup_targets(source_root))
}
