//! Shared test helpers for CLI integration tests.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Build script producing every output the default layout stages.
pub const PRODUCING_SCRIPT: &str = r#"
mkdir -p curated_alignments muscle_alignments IMGT_sequence_files HMMs
echo "interpreter=$PYTHON_SCRIPT"
echo 'GERMLINES = {}' > curated_alignments/germlines.py
echo model > HMMs/ALL.hmm
echo aligned > muscle_alignments/out.fasta
echo raw > IMGT_sequence_files/raw.fasta
"#;

/// Isolated source tree, site-packages and bin directory.
///
/// The config written next to the source switches the shell to `sh` and
/// installs the same binaries on every OS.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new(script: &str) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };

    env.write_file("src/bin/ANARCI", "#!/bin/sh\n");
    env.write_file("src/bin/muscle", "muscle");
    env.write_file("src/build_pipeline/RUN_pipeline.sh", &format!("set -e\n{}", script));
    env.write_file(
      "stagehand.json",
      r#"{ "shell": "sh", "binaries": [ { "source": "bin/ANARCI" }, { "source": "bin/muscle" } ] }"#,
    );
    fs::create_dir_all(env.package_dir()).unwrap();

    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  pub fn source_root(&self) -> PathBuf {
    self.temp.path().join("src")
  }

  pub fn workspace(&self) -> PathBuf {
    self.source_root().join("build_pipeline")
  }

  pub fn site_packages(&self) -> PathBuf {
    self.temp.path().join("site")
  }

  pub fn package_dir(&self) -> PathBuf {
    self.site_packages().join("anarci")
  }

  pub fn bin_dir(&self) -> PathBuf {
    self.temp.path().join("venv").join("bin")
  }

  pub fn log_file(&self) -> PathBuf {
    self.source_root().join("build_pipeline.log")
  }

  /// A `stagehand` command pointed at this environment.
  pub fn stagehand_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stagehand");
    cmd.current_dir(self.source_root());
    cmd.env_remove("STAGEHAND_PACKAGE_DIR");
    cmd.env_remove("STAGEHAND_BIN_DIR");
    cmd.env("STAGEHAND_SITE_PACKAGES", self.site_packages());
    cmd.env("STAGEHAND_PYTHON", "/opt/test/bin/python3");
    cmd.arg("--config").arg(self.temp.path().join("stagehand.json"));
    cmd.arg("--bin-dir").arg(self.bin_dir());
    cmd
  }
}
