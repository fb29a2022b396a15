//! Test utilities for stagehand-lib.
//!
//! Builds throwaway source trees with a fake build script standing in for
//! the real reference-data pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BinarySpec, StageConfig};

/// Default layout, run with `sh` so tests do not depend on bash.
pub fn test_config() -> StageConfig {
  StageConfig {
    shell: "sh".to_string(),
    binaries: vec![BinarySpec::any("bin/ANARCI"), BinarySpec::any("bin/muscle")],
    ..StageConfig::default()
  }
}

/// Write the build script into the workspace under `source_root`.
pub fn write_build_script(source_root: &Path, config: &StageConfig, body: &str) -> PathBuf {
  let workspace = config.workspace_dir(source_root);
  fs::create_dir_all(&workspace).unwrap();
  let script = workspace.join(&config.build_script);
  fs::write(&script, format!("set -e\n{}\n", body)).unwrap();
  script
}

/// Script body that produces the configured data module and models.
pub fn producing_script(config: &StageConfig, marker: &str) -> String {
  let module = config.data_module.display();
  let models = config.models.display();
  format!(
    "mkdir -p \"$(dirname {module})\" {models} muscle_alignments IMGT_sequence_files\n\
     echo 'GERMLINES = \"{marker}\"' > {module}\n\
     echo hmm-{marker} > {models}/ALL.hmm\n\
     echo aligned > muscle_alignments/out.fasta\n\
     echo raw > IMGT_sequence_files/raw.fasta\n"
  )
}

/// A source tree with companion binaries and a build script, plus an
/// installed package directory and a bin directory.
pub struct Fixture {
  pub root: tempfile::TempDir,
  pub config: StageConfig,
}

impl Fixture {
  pub fn new(script_body: &str) -> Self {
    let root = tempfile::TempDir::new().unwrap();
    let config = test_config();

    let bin = root.path().join("src").join("bin");
    fs::create_dir_all(&bin).unwrap();
    fs::write(bin.join("ANARCI"), "#!/bin/sh\n").unwrap();
    fs::write(bin.join("muscle"), "muscle").unwrap();
    fs::create_dir_all(root.path().join("site").join(&config.package_name)).unwrap();

    write_build_script(&root.path().join("src"), &config, script_body);

    Self { root, config }
  }

  /// A fixture whose build produces every output.
  pub fn producing(marker: &str) -> Self {
    Self::new(&producing_script(&test_config(), marker))
  }

  pub fn source_root(&self) -> PathBuf {
    self.root.path().join("src")
  }

  pub fn package_dir(&self) -> PathBuf {
    self.root.path().join("site").join(&self.config.package_name)
  }

  pub fn bin_dir(&self) -> PathBuf {
    self.root.path().join("venv-bin")
  }

  pub fn workspace(&self) -> PathBuf {
    self.config.workspace_dir(&self.source_root())
  }

  pub fn rewrite_script(&self, body: &str) {
    write_build_script(&self.source_root(), &self.config, body);
  }
}

/// Every file under `dir` with its content, keyed by relative path.
pub fn snapshot_tree(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
  let mut entries: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(dir)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .map(|e| {
      let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
      let content = fs::read(e.path()).unwrap();
      (rel, content)
    })
    .collect();
  entries.sort();
  entries
}
