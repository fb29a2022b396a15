//! Names and defaults shared across the crate.

pub const APP_NAME: &str = "stagehand";

/// Environment variable overriding the installed package directory.
pub const PACKAGE_DIR_ENV: &str = "STAGEHAND_PACKAGE_DIR";

/// Environment variable overriding the site-packages directory.
pub const SITE_PACKAGES_ENV: &str = "STAGEHAND_SITE_PACKAGES";

/// Environment variable overriding the executable directory.
pub const BIN_DIR_ENV: &str = "STAGEHAND_BIN_DIR";

/// Environment variable naming the interpreter to query and hand to the build.
pub const PYTHON_ENV: &str = "STAGEHAND_PYTHON";

/// Interpreter looked up on `PATH` when nothing else is configured.
pub const DEFAULT_PYTHON: &str = "python3";

/// Variable the build script reads to find the interpreter running the install.
pub const INTERPRETER_VAR: &str = "PYTHON_SCRIPT";
