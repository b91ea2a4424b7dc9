//! Implementation of the `mbuild build` command.
//!
//! Loads local artifacts, runs one build through the build service and prints
//! the result. Returns whether the build succeeded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use modelbuild_lib::{
  BuildExecutor, BuildFlags, BuildRequest, BuildResult, BuildService, ExecutorConfig, LocalProcessExecutor,
  SandboxedExecutor,
};

use super::inputs::{load_artifact, load_pairs};
use crate::output::{
  OutputFormat, format_duration, print_failure, print_json, print_stat, print_success, print_warning, truncate_hash,
};

pub struct BuildOptions {
  pub pairs: Vec<(PathBuf, PathBuf)>,
  pub glue: PathBuf,
  pub project: i64,
  pub scope: String,
  pub sandbox: bool,
  pub timeout: Option<Duration>,
  pub config: Option<PathBuf>,
  pub validate_only: bool,
  pub fail_on_warnings: bool,
  pub format: OutputFormat,
}

#[derive(Serialize)]
struct BuildOutput<'a> {
  project_id: i64,
  fingerprint: String,
  #[serde(flatten)]
  result: &'a BuildResult,
  duration_ms: u64,
}

pub fn cmd_build(options: BuildOptions) -> Result<bool> {
  let start = Instant::now();

  let mut config = match &options.config {
    Some(path) => ExecutorConfig::from_file(path)?,
    None => ExecutorConfig::from_env()?,
  };
  if let Some(timeout) = options.timeout {
    config = config.with_timeout(timeout);
  }
  debug!(sandbox = options.sandbox, timeout_secs = config.timeout_secs, "loaded executor config");

  let executor: Arc<dyn BuildExecutor> = if options.sandbox {
    Arc::new(SandboxedExecutor::new(config)?)
  } else {
    Arc::new(LocalProcessExecutor::new(config)?)
  };

  let (structural, descriptors) = load_pairs(&options.pairs)?;
  let request = BuildRequest {
    scope: options.scope,
    project_id: options.project,
    structural,
    descriptors,
    glue: load_artifact(&options.glue)?,
    flags: BuildFlags {
      validate_only: options.validate_only,
      fail_on_warnings: options.fail_on_warnings,
    },
  };
  let fingerprint = request.fingerprint().to_string();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let service = BuildService::new(executor);
  let result = rt.block_on(service.build(request)).context("Build could not be run")?;

  if options.format.is_json() {
    print_json(&BuildOutput {
      project_id: options.project,
      fingerprint,
      result: &result,
      duration_ms: start.elapsed().as_millis() as u64,
    })?;
  } else {
    print_result(&result, &fingerprint, start.elapsed());
  }

  Ok(result.success)
}

fn print_result(result: &BuildResult, fingerprint: &str, elapsed: Duration) {
  println!();
  if result.success {
    print_success("Build succeeded");
  } else if result.is_timeout() {
    print_warning("Build timed out");
  } else {
    print_failure("Build failed");
  }
  print_stat("Fingerprint", truncate_hash(fingerprint));
  print_stat("Errors", &result.error_count.to_string());
  print_stat("Warnings", &result.warning_count.to_string());
  if !result.discovered_namespaces.is_empty() {
    print_stat("Namespaces", &result.namespaces_joined());
  }
  print_stat("Duration", &format_duration(elapsed));

  if !result.report.trim().is_empty() {
    println!();
    println!("{}", result.report.trim_end());
  }
}
