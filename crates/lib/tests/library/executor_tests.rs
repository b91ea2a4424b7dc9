//! Executor behavior observed through the public API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use modelbuild_lib::consts::TIMEOUT_MARKER;
use modelbuild_lib::{BuildError, BuildExecutor, BuildService, LocalProcessExecutor};

use super::common::{TestEnv, scenario_request};

const WRITE_RESULT: &str = r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--result-file" ]; then out="$2"; fi
  shift
done"#;

#[tokio::test]
async fn hung_toolchain_times_out_within_margin() {
  let env = TestEnv::with_toolchain("sleep 60");
  let executor = LocalProcessExecutor::new(env.config(Duration::from_secs(1))).unwrap();

  let started = Instant::now();
  let result = executor.execute(scenario_request(1).to_input().unwrap()).await.unwrap();

  assert!(started.elapsed() < Duration::from_secs(10));
  assert!(!result.success);
  assert_eq!(result.error_count, 1);
  assert!(result.report.contains(TIMEOUT_MARKER));
  assert_eq!(env.leftover_work_dirs(), 0);
}

#[tokio::test]
async fn result_file_overrides_exit_code() {
  let env = TestEnv::with_toolchain(&format!(
    "{}\necho '{{\"success\": false, \"errors\": 2, \"report\": \"unresolved proxy\"}}' > \"$out\"\nexit 0",
    WRITE_RESULT
  ));
  let executor = LocalProcessExecutor::new(env.config(Duration::from_secs(10))).unwrap();

  let result = executor.execute(scenario_request(1).to_input().unwrap()).await.unwrap();

  assert!(!result.success);
  assert_eq!(result.error_count, 2);
  assert_eq!(result.report, "unresolved proxy");
  assert!(result.discovered_namespaces.is_empty());
  assert_eq!(env.leftover_work_dirs(), 0);
}

#[tokio::test]
async fn malformed_result_file_falls_back_to_console() {
  let env = TestEnv::with_toolchain(&format!(
    "{}\necho 'not json' > \"$out\"\necho 'model invalid' >&2\nexit 1",
    WRITE_RESULT
  ));
  let executor = LocalProcessExecutor::new(env.config(Duration::from_secs(10))).unwrap();

  let result = executor.execute(scenario_request(1).to_input().unwrap()).await.unwrap();

  assert!(!result.success);
  assert_eq!(result.error_count, 1);
  assert_eq!(result.report.trim(), "model invalid");
}

#[tokio::test]
async fn failures_leave_no_work_dirs() {
  let env = TestEnv::with_toolchain("echo boom >&2; exit 3");
  let executor = LocalProcessExecutor::new(env.config(Duration::from_secs(10))).unwrap();

  for project in 0..3 {
    let result = executor.execute(scenario_request(project).to_input().unwrap()).await.unwrap();
    assert!(!result.success);
  }
  assert_eq!(env.leftover_work_dirs(), 0);
}

#[tokio::test]
async fn service_surfaces_missing_toolchain_as_error() {
  let env = TestEnv::with_toolchain("exit 0");
  let mut config = env.config(Duration::from_secs(10));
  config.local.program = Some(env.temp.path().join("not-installed"));
  let service = BuildService::new(Arc::new(LocalProcessExecutor::new(config).unwrap()));

  let err = service.build(scenario_request(1)).await.unwrap_err();

  assert!(matches!(err, BuildError::ToolchainUnavailable { .. }));
  assert!(err.is_infrastructure());
}
