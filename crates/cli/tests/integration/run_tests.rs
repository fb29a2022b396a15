use std::fs;

use predicates::prelude::*;

use super::common::{PRODUCING_SCRIPT, TestEnv};

#[test]
fn run_installs_stages_and_cleans() {
  let env = TestEnv::new(PRODUCING_SCRIPT);

  env
    .stagehand_cmd()
    .env_remove("RUST_LOG")
    .arg("run")
    .assert()
    .success()
    .stdout(predicate::str::contains("Install complete"))
    .stderr(predicate::str::contains("build log kept"));

  assert!(env.bin_dir().join("ANARCI").is_file());
  assert!(env.bin_dir().join("muscle").is_file());
  assert_eq!(
    fs::read_to_string(env.package_dir().join("germlines.py")).unwrap(),
    "GERMLINES = {}\n"
  );
  assert!(env.package_dir().join("dat/HMMs/ALL.hmm").is_file());
  assert!(!env.workspace().join("muscle_alignments").exists());
  assert!(!env.workspace().join("IMGT_sequence_files").exists());
  assert!(!env.workspace().join("curated_alignments").exists());
}

#[test]
fn run_passes_interpreter_to_build() {
  let env = TestEnv::new(PRODUCING_SCRIPT);

  env.stagehand_cmd().arg("run").assert().success();

  let log = fs::read_to_string(env.log_file()).unwrap();
  assert!(log.contains("interpreter=/opt/test/bin/python3"));
}

#[test]
fn failed_build_reports_log_and_exits_non_zero() {
  let env = TestEnv::new("echo 'could not reach reference server'\nexit 4");

  env
    .stagehand_cmd()
    .arg("run")
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("exited with status 4"))
    .stdout(predicate::str::contains("build_pipeline.log"));

  assert!(!env.package_dir().join("dat").exists());
  assert!(
    fs::read_to_string(env.log_file())
      .unwrap()
      .contains("could not reach reference server")
  );
}

#[test]
fn missing_models_is_staging_error() {
  let env = TestEnv::new("mkdir -p curated_alignments\necho 'X = 1' > curated_alignments/germlines.py");

  env
    .stagehand_cmd()
    .arg("run")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Install aborted during stage"))
    .stderr(predicate::str::contains("dat/HMMs"));
}

#[test]
fn run_json_reports_done() {
  let env = TestEnv::new(PRODUCING_SCRIPT);

  env
    .stagehand_cmd()
    .args(["run", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"status\": \"done\""))
    .stdout(predicate::str::contains("\"staged\""))
    .stdout(predicate::str::contains("\"cleanup\""));
}

#[test]
fn run_json_reports_abort() {
  let env = TestEnv::new("exit 2");

  env
    .stagehand_cmd()
    .args(["run", "-o", "json"])
    .assert()
    .failure()
    .stdout(predicate::str::contains("\"status\": \"abort\""))
    .stdout(predicate::str::contains("\"step\": \"build\""));
}

#[test]
fn second_run_replaces_models() {
  let env = TestEnv::new(PRODUCING_SCRIPT);
  env.stagehand_cmd().arg("run").assert().success();
  fs::write(env.package_dir().join("dat/HMMs/stale.hmm"), "stale").unwrap();

  env.stagehand_cmd().arg("run").assert().success();

  assert!(!env.package_dir().join("dat/HMMs/stale.hmm").exists());
  assert!(env.package_dir().join("dat/HMMs/ALL.hmm").exists());
}
