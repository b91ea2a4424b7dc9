//! Executor configuration.
//!
//! Configuration is an explicit value handed to executor constructors. It can
//! be built in code, read from `MBUILD_*` environment variables with
//! [`ExecutorConfig::from_env`], or loaded from a JSON file with
//! [`ExecutorConfig::from_file`]. Required fields are checked by the executor
//! that needs them, so one config can describe both strategies.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_SECS};
use crate::error::BuildError;

/// How to launch the toolchain directly on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalToolchainConfig {
  /// Launcher binary, e.g. `java`.
  pub program: Option<PathBuf>,
  /// Leading arguments, e.g. `["-jar", "/opt/toolchain.jar"]`.
  pub args: Vec<String>,
}

/// How to launch the toolchain inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
  /// Container CLI, `docker` or `podman`.
  pub runtime: PathBuf,
  pub image: Option<String>,
  pub cpus: String,
  pub memory: String,
  pub pids_limit: u32,
  /// Toolchain launcher inside the image.
  pub program: String,
  pub args: Vec<String>,
}

impl Default for SandboxConfig {
  fn default() -> Self {
    Self {
      runtime: PathBuf::from("docker"),
      image: None,
      cpus: "1".to_string(),
      memory: "1g".to_string(),
      pids_limit: 256,
      program: "java".to_string(),
      args: Vec::new(),
    }
  }
}

/// Deployment configuration shared by both executor strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
  pub timeout_secs: u64,
  /// Parent directory of per-build work directories.
  pub work_root: PathBuf,
  /// Cap on retained bytes per console stream.
  pub max_output_bytes: usize,
  pub local: LocalToolchainConfig,
  pub sandbox: SandboxConfig,
}

impl Default for ExecutorConfig {
  fn default() -> Self {
    Self {
      timeout_secs: DEFAULT_TIMEOUT_SECS,
      work_root: std::env::temp_dir(),
      max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
      local: LocalToolchainConfig::default(),
      sandbox: SandboxConfig::default(),
    }
  }
}

impl ExecutorConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  /// Set the limit, rounding sub-second remainders up to a whole second.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    let partial = u64::from(timeout.subsec_nanos() > 0);
    self.timeout_secs = timeout.as_secs().saturating_add(partial).max(1);
    self
  }

  /// Reject values no executor can work with.
  pub fn validate(&self) -> Result<(), BuildError> {
    if self.timeout_secs == 0 {
      return Err(BuildError::toolchain("timeout_secs must be at least 1"));
    }
    Ok(())
  }

  /// Read configuration from `MBUILD_*` environment variables.
  ///
  /// Unset variables keep their defaults. List-valued variables
  /// (`MBUILD_TOOLCHAIN_ARGS`, `MBUILD_SANDBOX_ARGS`) are split on whitespace.
  pub fn from_env() -> Result<Self, BuildError> {
    let mut config = Self::default();

    if let Some(v) = env_var("MBUILD_TIMEOUT_SECS") {
      config.timeout_secs = parse_var("MBUILD_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = env_var("MBUILD_WORK_ROOT") {
      config.work_root = PathBuf::from(v);
    }
    if let Some(v) = env_var("MBUILD_MAX_OUTPUT_BYTES") {
      config.max_output_bytes = parse_var("MBUILD_MAX_OUTPUT_BYTES", &v)?;
    }

    if let Some(v) = env_var("MBUILD_TOOLCHAIN") {
      config.local.program = Some(PathBuf::from(v));
    }
    if let Some(v) = env_var("MBUILD_TOOLCHAIN_ARGS") {
      config.local.args = split_args(&v);
    }

    if let Some(v) = env_var("MBUILD_SANDBOX_RUNTIME") {
      config.sandbox.runtime = PathBuf::from(v);
    }
    if let Some(v) = env_var("MBUILD_SANDBOX_IMAGE") {
      config.sandbox.image = Some(v);
    }
    if let Some(v) = env_var("MBUILD_SANDBOX_CPUS") {
      config.sandbox.cpus = v;
    }
    if let Some(v) = env_var("MBUILD_SANDBOX_MEMORY") {
      config.sandbox.memory = v;
    }
    if let Some(v) = env_var("MBUILD_SANDBOX_PIDS_LIMIT") {
      config.sandbox.pids_limit = parse_var("MBUILD_SANDBOX_PIDS_LIMIT", &v)?;
    }
    if let Some(v) = env_var("MBUILD_SANDBOX_PROGRAM") {
      config.sandbox.program = v;
    }
    if let Some(v) = env_var("MBUILD_SANDBOX_ARGS") {
      config.sandbox.args = split_args(&v);
    }

    config.validate()?;
    Ok(config)
  }

  /// Load configuration from a JSON file. Missing fields keep their defaults.
  pub fn from_file(path: &Path) -> Result<Self, BuildError> {
    let content = std::fs::read_to_string(path)
      .map_err(|e| BuildError::toolchain(format!("failed to read config {}: {}", path.display(), e)))?;
    let config: Self = serde_json::from_str(&content)
      .map_err(|e| BuildError::toolchain(format!("failed to parse config {}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
  }
}

/// Returns the variable's value, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, BuildError>
where
  T::Err: std::fmt::Display,
{
  value
    .trim()
    .parse()
    .map_err(|e| BuildError::toolchain(format!("invalid {}={:?}: {}", name, value, e)))
}

fn split_args(value: &str) -> Vec<String> {
  value.split_whitespace().map(str::to_string).collect()
}
