use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_removes_intermediates_only() {
  let env = TestEnv::new("true");
  env.write_file("src/build_pipeline/muscle_alignments/a.fasta", "a");
  env.write_file("src/build_pipeline/IMGT_sequence_files/b.fasta", "b");
  env.write_file("src/build_pipeline/HMMs/ALL.hmm", "model");

  env
    .stagehand_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed: 2"));

  assert!(!env.workspace().join("muscle_alignments").exists());
  assert!(!env.workspace().join("IMGT_sequence_files").exists());
  assert!(env.workspace().join("HMMs/ALL.hmm").exists());
}

#[test]
fn clean_warns_but_succeeds_on_failure() {
  let env = TestEnv::new("true");
  env.write_file(
    "stagehand.json",
    r#"{ "shell": "sh", "cleanup": ["muscle_alignments", "blocker/inner"] }"#,
  );
  env.write_file("src/build_pipeline/muscle_alignments/a.fasta", "a");
  env.write_file("src/build_pipeline/blocker", "not a directory");

  env
    .stagehand_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed: 1"))
    .stderr(predicate::str::contains("Could not remove"))
    .stderr(predicate::str::contains("blocker"));

  assert!(!env.workspace().join("muscle_alignments").exists());
  assert!(env.workspace().join("blocker").is_file());
}

#[test]
fn clean_json_lists_outcomes() {
  let env = TestEnv::new("true");
  env.write_file("src/build_pipeline/muscle_alignments/a.fasta", "a");

  env
    .stagehand_cmd()
    .args(["clean", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"status\": \"removed\""))
    .stdout(predicate::str::contains("\"status\": \"absent\""));
}
