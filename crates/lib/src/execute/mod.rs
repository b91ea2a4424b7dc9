//! Build execution strategies.
//!
//! Every strategy runs the same state machine:
//!
//! ```text
//! Staging -> Running -> Timeout | Crashed | Completed
//! ```
//!
//! - **Staging**: create a private work dir and write the artifacts into it
//! - **Running**: spawn the toolchain, drain its output, wait up to the limit
//! - **Timeout**: kill the process tree, report a `[TIMEOUT]` failure
//! - **Crashed**: staging or draining hit an I/O error, report a `[CRASHED]` failure
//! - **Completed**: interpret the result file or the exit status
//!
//! The work dir is removed on every path. Strategies differ only in how the
//! toolchain command is built (see [`local`] and [`sandbox`]).
//!
//! Only environment problems (no work dir, toolchain cannot be spawned,
//! missing configuration) are returned as errors; every build outcome is a
//! [`BuildResult`].

pub mod interpret;
pub mod local;
pub mod process;
pub mod sandbox;
pub mod stage;

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::build::{BuildFlags, BuildInput, BuildResult};
use crate::config::ExecutorConfig;
use crate::error::BuildError;

use process::{ConsoleOutput, ProcessError, ProcessOutcome, run_with_timeout};
use stage::{StagedLayout, WorkDir};

pub use local::LocalProcessExecutor;
pub use sandbox::SandboxedExecutor;

/// Limit for auxiliary commands such as killing a timed-out container.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs one build for a set of inputs.
#[async_trait]
pub trait BuildExecutor: Send + Sync {
  /// Run a build. Rejected, timed-out and crashed builds are `Ok` results
  /// with `success == false`.
  async fn execute(&self, input: BuildInput) -> Result<BuildResult, BuildError>;
}

/// How a strategy turns a staged work dir into a toolchain invocation.
pub(crate) trait Launcher: Send + Sync {
  /// Short name for logs and error messages.
  fn name(&self) -> &'static str;

  /// The command that runs the toolchain against the staged work dir.
  fn command(&self, work: &WorkDir, layout: &StagedLayout, flags: BuildFlags) -> Command;

  /// Extra command to run after the process tree was killed on timeout.
  fn timeout_cleanup(&self, _work: &WorkDir) -> Option<Command> {
    None
  }

  /// Map an exit that means the launcher never started the toolchain to an
  /// error. Only consulted when no result file was written.
  fn startup_failure(&self, _code: i32, _console: &ConsoleOutput) -> Option<BuildError> {
    None
  }
}

/// Toolchain flags for a work dir visible to the toolchain at `root`.
///
/// ```text
/// --pairs root/models/0/a.ecore,root/models/0/a.genmodel;...
/// --reactions root/glue/r.reactions --workdir root --result-file root/out/build-result.json
/// ```
pub fn toolchain_args(root: &Path, layout: &StagedLayout, flags: BuildFlags) -> Vec<String> {
  let pairs = layout
    .pairs
    .iter()
    .map(|(structural, descriptor)| {
      format!(
        "{},{}",
        root.join(structural).display(),
        root.join(descriptor).display()
      )
    })
    .collect::<Vec<_>>()
    .join(";");

  let mut args = vec![
    "--pairs".to_string(),
    pairs,
    "--reactions".to_string(),
    root.join(&layout.glue).display().to_string(),
    "--workdir".to_string(),
    root.display().to_string(),
    "--result-file".to_string(),
    root.join(&layout.result_file).display().to_string(),
  ];
  args.extend(flags.to_args());
  args
}

/// Run the full state machine for one build.
pub(crate) async fn run_build<L: Launcher>(
  launcher: &L,
  config: &ExecutorConfig,
  input: BuildInput,
) -> Result<BuildResult, BuildError> {
  input.validate()?;

  let started = Instant::now();
  let work = WorkDir::create(&config.work_root)?;
  info!(
    strategy = launcher.name(),
    project_id = input.project_id,
    work_dir = ?work.path(),
    "starting build"
  );

  let outcome = run_staged(launcher, config, &work, &input).await;
  work.teardown();

  let result = outcome?;
  info!(
    strategy = launcher.name(),
    project_id = input.project_id,
    success = result.success,
    errors = result.error_count,
    warnings = result.warning_count,
    elapsed_ms = started.elapsed().as_millis() as u64,
    "build settled"
  );
  Ok(result)
}

async fn run_staged<L: Launcher>(
  launcher: &L,
  config: &ExecutorConfig,
  work: &WorkDir,
  input: &BuildInput,
) -> Result<BuildResult, BuildError> {
  let layout = match work.stage(input).await {
    Ok(layout) => layout,
    Err(e) => {
      warn!(work_dir = ?work.path(), error = %e, "failed to stage build inputs");
      return Ok(BuildResult::crashed(format!("failed to stage build inputs: {}", e)));
    }
  };

  let command = launcher.command(work, &layout, input.flags);
  let limit = config.timeout();

  match run_with_timeout(command, limit, config.max_output_bytes).await {
    Ok(ProcessOutcome::Exited { code, console }) => {
      let result_file = work.result_file();
      if let Some(err) = launcher.startup_failure(code, &console)
        && !tokio::fs::try_exists(&result_file).await.unwrap_or(false)
      {
        warn!(strategy = launcher.name(), exit_code = code, error = %err, "toolchain did not start");
        return Err(err);
      }
      Ok(interpret::interpret_exit(code, &console, &result_file).await)
    }
    Ok(ProcessOutcome::TimedOut { console }) => {
      if let Some(cleanup) = launcher.timeout_cleanup(work) {
        run_cleanup(cleanup).await;
      }
      Ok(BuildResult::timed_out(limit, &console.combined()))
    }
    Err(ProcessError::Spawn(e)) => Err(BuildError::toolchain(format!(
      "failed to start {} toolchain: {}",
      launcher.name(),
      e
    ))),
    Err(ProcessError::Io(e)) => {
      warn!(work_dir = ?work.path(), error = %e, "I/O error while running toolchain");
      Ok(BuildResult::crashed(format!("I/O error while running toolchain: {}", e)))
    }
  }
}

async fn run_cleanup(mut command: Command) {
  command.kill_on_drop(true);
  match tokio::time::timeout(CLEANUP_TIMEOUT, command.output()).await {
    Ok(Ok(output)) if output.status.success() => debug!("timeout cleanup succeeded"),
    Ok(Ok(output)) => warn!(
      code = ?output.status.code(),
      stderr = %String::from_utf8_lossy(&output.stderr).trim(),
      "timeout cleanup failed"
    ),
    Ok(Err(e)) => warn!(error = %e, "failed to run timeout cleanup"),
    Err(_) => warn!("timeout cleanup did not finish in time"),
  }
}
