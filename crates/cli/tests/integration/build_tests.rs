use predicates::prelude::*;

use super::common::{TestEnv, write_result};

#[test]
fn successful_build_exits_zero() {
  let env = TestEnv::with_artifacts();
  env.toolchain("echo 'generated 1 package'");

  env
    .build_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Build succeeded"))
    .stdout(predicate::str::contains("generated 1 package"));

  assert_eq!(env.leftover_work_dirs(), 0);
}

#[test]
fn rejected_build_exits_one() {
  let env = TestEnv::with_artifacts();
  env.toolchain("echo 'unresolved reference' >&2; exit 1");

  env
    .build_cmd()
    .assert()
    .code(1)
    .stdout(predicate::str::contains("Build failed"))
    .stdout(predicate::str::contains("unresolved reference"));
}

#[test]
fn result_file_drives_the_outcome() {
  let env = TestEnv::with_artifacts();
  env.toolchain(&write_result(
    r#"{"success": false, "errors": 2, "warnings": 1, "report": "2 errors", "nsUris": ["http://a"]}"#,
  ));

  env
    .build_cmd()
    .assert()
    .code(1)
    .stdout(predicate::str::contains("Errors: 2"))
    .stdout(predicate::str::contains("Warnings: 1"));
}

#[test]
fn json_output_contains_the_result() {
  let env = TestEnv::with_artifacts();
  env.toolchain(&write_result(
    r#"{"success": true, "warnings": 3, "report": "ok", "nsUris": ["http://a", "http://b"]}"#,
  ));

  let output = env.build_cmd().args(["--format", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["success"], true);
  assert_eq!(json["warning_count"], 3);
  assert_eq!(json["report"], "ok");
  assert_eq!(json["project_id"], 7);
  assert_eq!(json["discovered_namespaces"][1], "http://b");
  assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

#[test]
fn flags_reach_the_toolchain() {
  let env = TestEnv::with_artifacts();
  env.toolchain(r#"echo "args: $*""#);

  env
    .build_cmd()
    .args(["--validate-only", "--fail-on-warnings"])
    .assert()
    .success()
    .stdout(predicate::str::contains("--validate-only --fail-on-warnings"));
}

#[test]
fn timeout_flag_limits_the_build() {
  let env = TestEnv::with_artifacts();
  env.toolchain("sleep 30");

  env
    .build_cmd()
    .args(["--timeout", "1s"])
    .timeout(std::time::Duration::from_secs(20))
    .assert()
    .code(1)
    .stdout(predicate::str::contains("Build timed out"))
    .stdout(predicate::str::contains("[TIMEOUT]"));

  assert_eq!(env.leftover_work_dirs(), 0);
}

#[test]
fn config_file_replaces_environment() {
  let env = TestEnv::with_artifacts();
  env.toolchain("echo from-config");
  let config = serde_json::json!({
    "timeout_secs": 10,
    "work_root": env.path().join("other-work"),
    "local": { "program": env.path().join("toolchain.sh") }
  });
  env.write_file("mbuild.json", &config.to_string());

  env
    .build_cmd()
    .env("MBUILD_TOOLCHAIN", env.path().join("missing"))
    .args(["--config", "mbuild.json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("from-config"));
}
