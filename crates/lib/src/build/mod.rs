//! Running the external build script.

pub mod execute;
pub mod types;

pub use execute::run_build;
pub use types::{BuildInvocation, BuildResult, SuccessfulBuild};
