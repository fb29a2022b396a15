use predicates::prelude::*;

use super::common::{PRODUCING_SCRIPT, TestEnv};

#[test]
fn plan_lists_steps_without_running_them() {
  let env = TestEnv::new("touch build-ran");

  env
    .stagehand_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("Install 2 executable(s)"))
    .stdout(predicate::str::contains("sh RUN_pipeline.sh"))
    .stdout(predicate::str::contains("PYTHON_SCRIPT=/opt/test/bin/python3"))
    .stdout(predicate::str::contains("Stage 2 artifact(s)"))
    .stdout(predicate::str::contains("Clean 3 intermediate path(s)"));

  assert!(!env.workspace().join("build-ran").exists());
  assert!(!env.bin_dir().exists());
  assert!(!env.log_file().exists());
}

#[test]
fn plan_json_is_valid() {
  let env = TestEnv::new(PRODUCING_SCRIPT);

  let output = env.stagehand_cmd().args(["plan", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(plan["artifacts"][0]["kind"], "file");
  assert_eq!(plan["artifacts"][1]["kind"], "directory");
  assert_eq!(plan["invocation"]["command"][0], "sh");
  assert!(plan["invocation"].get("environment").is_none());
}

#[test]
fn config_can_pin_package_dir() {
  let env = TestEnv::new(PRODUCING_SCRIPT);
  let pinned = env.temp.path().join("elsewhere").join("anarci");
  std::fs::create_dir_all(&pinned).unwrap();
  env.write_file(
    "stagehand.json",
    &serde_json::json!({
      "shell": "sh",
      "package_dir": pinned,
    })
    .to_string(),
  );

  let output = env.stagehand_cmd().args(["plan", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let expected = std::fs::canonicalize(&pinned).unwrap();
  assert_eq!(plan["target"]["package_dir"].as_str(), expected.to_str());
}

#[test]
fn package_dir_flag_overrides_config() {
  let env = TestEnv::new(PRODUCING_SCRIPT);
  env.write_file(
    "stagehand.json",
    &serde_json::json!({
      "shell": "sh",
      "package_dir": env.temp.path().join("not-installed"),
    })
    .to_string(),
  );

  env
    .stagehand_cmd()
    .arg("plan")
    .arg("--package-dir")
    .arg(env.package_dir())
    .assert()
    .success();

  env
    .stagehand_cmd()
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("not-installed"));
}
