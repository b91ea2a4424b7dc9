//! Host-process strategy.
//!
//! Runs the toolchain binary directly, with the current user's privileges and
//! environment, using the staged work dir as its working directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::build::{BuildFlags, BuildInput, BuildResult};
use crate::config::ExecutorConfig;
use crate::error::BuildError;
use crate::execute::stage::{StagedLayout, WorkDir};
use crate::execute::{BuildExecutor, Launcher, run_build, toolchain_args};

pub struct LocalProcessExecutor {
  config: ExecutorConfig,
  program: PathBuf,
}

impl LocalProcessExecutor {
  /// Fails with [`BuildError::ToolchainUnavailable`] when no toolchain binary
  /// is configured.
  pub fn new(config: ExecutorConfig) -> Result<Self, BuildError> {
    config.validate()?;
    let program = config
      .local
      .program
      .clone()
      .filter(|p| !p.as_os_str().is_empty())
      .ok_or_else(|| BuildError::toolchain("no local toolchain binary configured (MBUILD_TOOLCHAIN)"))?;
    Ok(Self { config, program })
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }
}

impl Launcher for LocalProcessExecutor {
  fn name(&self) -> &'static str {
    "local"
  }

  fn command(&self, work: &WorkDir, layout: &StagedLayout, flags: BuildFlags) -> Command {
    let mut command = Command::new(&self.program);
    command
      .args(&self.config.local.args)
      .args(toolchain_args(work.path(), layout, flags))
      .current_dir(work.path());
    command
  }
}

#[async_trait]
impl BuildExecutor for LocalProcessExecutor {
  async fn execute(&self, input: BuildInput) -> Result<BuildResult, BuildError> {
    run_build(self, &self.config, input).await
  }
}
