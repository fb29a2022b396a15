//! Runtime environment lookup: the current OS and where the installed
//! package and its executables live.

pub mod locate;
pub mod os;

pub use locate::{InstallationTarget, LocateOptions, locate, resolve_interpreter};
pub use os::Os;
