use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating systems a companion binary can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  Linux,
  #[serde(rename = "darwin")]
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
