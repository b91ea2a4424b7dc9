//! Concurrent submissions of the same artifacts.

use std::sync::Arc;

use modelbuild_lib::{Artifact, BuildResult};

use super::common::{COUNTING_TOOLCHAIN, TestEnv, scenario_request};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn identical_concurrent_requests_run_the_toolchain_once() {
  let env = TestEnv::with_toolchain(COUNTING_TOOLCHAIN);
  let service = env.service();

  let first = scenario_request(42);
  let second = scenario_request(42);
  assert_eq!(first.fingerprint(), second.fingerprint());

  let (a, b) = tokio::join!(service.build(first), service.build(second));
  let (a, b) = (a.unwrap(), b.unwrap());

  assert_eq!(env.invocations(), 1);
  assert!(a.success);
  assert_eq!(a.report, "generated 1 pair(s)");
  assert_eq!(a.report, b.report);
  assert!(Arc::ptr_eq(&a, &b));
  assert_eq!(a.namespaces_joined(), "http://example.org/a");
  assert_eq!(env.leftover_work_dirs(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn callers_on_separate_tasks_share_the_execution() {
  let env = TestEnv::with_toolchain(COUNTING_TOOLCHAIN);
  let service = env.service();

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let service = service.clone();
      tokio::spawn(async move { service.build(scenario_request(42)).await })
    })
    .collect();

  let mut results: Vec<Arc<BuildResult>> = Vec::new();
  for handle in handles {
    results.push(handle.await.unwrap().unwrap());
  }

  assert_eq!(env.invocations(), 1);
  assert!(results.iter().all(|r| r.report == results[0].report));
}

#[tokio::test]
async fn different_projects_run_separately() {
  let env = TestEnv::with_toolchain(COUNTING_TOOLCHAIN);
  let service = env.service();

  let (a, b) = tokio::join!(service.build(scenario_request(1)), service.build(scenario_request(2)));

  assert!(a.unwrap().success);
  assert!(b.unwrap().success);
  assert_eq!(env.invocations(), 2);
}

#[tokio::test]
async fn a_settled_build_is_not_reused() {
  let env = TestEnv::with_toolchain(COUNTING_TOOLCHAIN);
  let service = env.service();

  service.build(scenario_request(42)).await.unwrap();
  assert_eq!(service.coordinator().in_flight(), 0);
  service.build(scenario_request(42)).await.unwrap();

  assert_eq!(env.invocations(), 2);
}

#[tokio::test]
async fn changed_bytes_start_a_new_build() {
  let env = TestEnv::with_toolchain(COUNTING_TOOLCHAIN);
  let service = env.service();

  let original = scenario_request(42);
  let mut edited = scenario_request(42);
  edited.glue = Artifact::new("r.reactions", b"reactions: a2a in reaction to changes in A".to_vec());
  assert_ne!(original.fingerprint(), edited.fingerprint());

  let (a, b) = tokio::join!(service.build(original), service.build(edited));

  assert!(!Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
  assert_eq!(env.invocations(), 2);
}
