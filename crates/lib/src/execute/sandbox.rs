//! Container strategy.
//!
//! Runs the toolchain inside a throwaway container with the staged work dir
//! bind-mounted at [`SANDBOX_WORKSPACE`]. The container has no network, a
//! read-only root filesystem, no capabilities, and bounded CPU, memory and
//! process count. It is named after the work dir so a timed-out build can be
//! killed through the runtime even when the runtime client was already gone.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::build::{BuildFlags, BuildInput, BuildResult};
use crate::config::ExecutorConfig;
use crate::consts::SANDBOX_WORKSPACE;
use crate::error::BuildError;
use crate::execute::process::ConsoleOutput;
use crate::execute::stage::{StagedLayout, WorkDir};
use crate::execute::{BuildExecutor, Launcher, run_build, toolchain_args};

/// Exit codes the container runtime itself uses when a container cannot run:
/// 125 for runtime errors (daemon, image, invalid options), 126 when the
/// command cannot be invoked and 127 when it cannot be found.
const RUNTIME_FAILURE_CODES: [i32; 3] = [125, 126, 127];

pub struct SandboxedExecutor {
  config: ExecutorConfig,
  image: String,
}

impl SandboxedExecutor {
  /// Fails with [`BuildError::ToolchainUnavailable`] when no image is configured.
  pub fn new(config: ExecutorConfig) -> Result<Self, BuildError> {
    config.validate()?;
    let image = config
      .sandbox
      .image
      .clone()
      .filter(|image| !image.trim().is_empty())
      .ok_or_else(|| BuildError::toolchain("no sandbox image configured (MBUILD_SANDBOX_IMAGE)"))?;
    Ok(Self { config, image })
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  /// Arguments passed to the container runtime for one build.
  pub fn run_args(&self, name: &str, host_dir: &Path, layout: &StagedLayout, flags: BuildFlags) -> Vec<String> {
    let sandbox = &self.config.sandbox;
    let mut args: Vec<String> = vec![
      "run".into(),
      "--rm".into(),
      "--name".into(),
      name.into(),
      "--read-only".into(),
      "--network".into(),
      "none".into(),
      "--cpus".into(),
      sandbox.cpus.clone(),
      "--memory".into(),
      sandbox.memory.clone(),
      "--pids-limit".into(),
      sandbox.pids_limit.to_string(),
      "--tmpfs".into(),
      "/tmp:rw,noexec,nosuid,size=64m".into(),
      "--cap-drop".into(),
      "ALL".into(),
      "--security-opt".into(),
      "no-new-privileges".into(),
    ];

    // Outputs written into the mount stay removable by this process.
    #[cfg(unix)]
    {
      let uid = rustix::process::getuid().as_raw();
      let gid = rustix::process::getgid().as_raw();
      args.push("--user".into());
      args.push(format!("{}:{}", uid, gid));
    }

    args.push("--volume".into());
    args.push(format!("{}:{}:rw", host_dir.display(), SANDBOX_WORKSPACE));
    args.push("--workdir".into());
    args.push(SANDBOX_WORKSPACE.into());
    args.push(self.image.clone());
    args.push(sandbox.program.clone());
    args.extend(sandbox.args.iter().cloned());
    args.extend(toolchain_args(Path::new(SANDBOX_WORKSPACE), layout, flags));
    args
  }
}

impl Launcher for SandboxedExecutor {
  fn name(&self) -> &'static str {
    "sandbox"
  }

  fn command(&self, work: &WorkDir, layout: &StagedLayout, flags: BuildFlags) -> Command {
    let mut command = Command::new(&self.config.sandbox.runtime);
    command.args(self.run_args(&work.name(), work.path(), layout, flags));
    command
  }

  fn timeout_cleanup(&self, work: &WorkDir) -> Option<Command> {
    let mut command = Command::new(&self.config.sandbox.runtime);
    command.arg("kill").arg(work.name());
    Some(command)
  }

  fn startup_failure(&self, code: i32, console: &ConsoleOutput) -> Option<BuildError> {
    if !RUNTIME_FAILURE_CODES.contains(&code) {
      return None;
    }
    Some(BuildError::toolchain(format!(
      "container runtime {} exited with code {}: {}",
      self.config.sandbox.runtime.display(),
      code,
      console.preferring_stderr().trim()
    )))
  }
}

#[async_trait]
impl BuildExecutor for SandboxedExecutor {
  async fn execute(&self, input: BuildInput) -> Result<BuildResult, BuildError> {
    run_build(self, &self.config, input).await
  }
}
