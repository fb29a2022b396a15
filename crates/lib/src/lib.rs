//! stagehand-lib: post-install build-and-stage pipeline.
//!
//! After a package is installed, this crate:
//! - locates the installed package and executable directories (`platform`)
//! - installs companion executables (`install`)
//! - runs the external build script and waits for it (`build`)
//! - stages the generated data module and model directory (`stage`)
//! - removes intermediate workspace directories, best-effort (`clean`)
//!
//! `pipeline` strings these together in a single forward pass.

pub mod build;
pub mod clean;
pub mod config;
pub mod consts;
pub mod error;
pub mod install;
pub mod pipeline;
pub mod platform;
pub mod stage;

#[cfg(test)]
mod util;

pub use error::PipelineError;
