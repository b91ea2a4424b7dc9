//! Toolchain process supervision.
//!
//! Spawns the toolchain with piped output, drains stdout and stderr
//! concurrently (a full pipe would otherwise block the child forever), waits
//! for exit up to a time limit and, on timeout, kills the whole process group
//! and reaps the child.

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::consts::SIGNALED_EXIT_CODE;

/// How long to keep draining after the child is gone. Grandchildren that
/// escaped the process group may still hold the pipes open.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8192;

/// Captured console text of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleOutput {
  pub stdout: String,
  pub stderr: String,
}

impl ConsoleOutput {
  /// Stdout followed by stderr when the latter is non-blank.
  pub fn combined(&self) -> String {
    match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
      (_, true) => self.stdout.clone(),
      (true, false) => self.stderr.clone(),
      (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
    }
  }

  /// Stderr when non-blank, else stdout.
  pub fn preferring_stderr(&self) -> &str {
    if self.stderr.trim().is_empty() {
      &self.stdout
    } else {
      &self.stderr
    }
  }
}

/// How a supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
  /// The process exited on its own. `code` is [`SIGNALED_EXIT_CODE`] when it
  /// was killed by a signal.
  Exited { code: i32, console: ConsoleOutput },
  /// The time limit elapsed and the process tree was killed.
  TimedOut { console: ConsoleOutput },
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
  #[error("failed to spawn process: {0}")]
  Spawn(#[source] io::Error),

  #[error("process I/O failed: {0}")]
  Io(#[source] io::Error),
}

/// Run `command` to completion or until `limit` elapses.
///
/// Stdin is closed. Each output stream keeps at most `max_output` bytes; the
/// rest is drained and discarded.
pub async fn run_with_timeout(
  mut command: Command,
  limit: Duration,
  max_output: usize,
) -> Result<ProcessOutcome, ProcessError> {
  command
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

  // New process group so the whole tree can be killed at once.
  #[cfg(unix)]
  command.process_group(0);

  let started = Instant::now();
  let mut child = command.spawn().map_err(ProcessError::Spawn)?;
  debug!(pid = ?child.id(), "spawned toolchain process");

  let stdout_buf = Arc::new(Mutex::new(CappedBuffer::new(max_output)));
  let stderr_buf = Arc::new(Mutex::new(CappedBuffer::new(max_output)));
  let stdout_task = tokio::spawn(drain(child.stdout.take(), "stdout", stdout_buf.clone()));
  let stderr_task = tokio::spawn(drain(child.stderr.take(), "stderr", stderr_buf.clone()));

  let status = match tokio::time::timeout(limit, child.wait()).await {
    Ok(status) => Some(status.map_err(ProcessError::Io)?),
    Err(_) => {
      warn!(pid = ?child.id(), limit_secs = limit.as_secs_f64(), "toolchain timed out, killing process tree");
      kill_tree(&mut child);
      child.wait().await.map_err(ProcessError::Io)?;
      None
    }
  };

  let stdout_result = finish_drain(stdout_task, "stdout").await;
  let stderr_result = finish_drain(stderr_task, "stderr").await;
  stdout_result.map_err(ProcessError::Io)?;
  stderr_result.map_err(ProcessError::Io)?;

  let console = ConsoleOutput {
    stdout: stdout_buf.lock().to_string_lossy(),
    stderr: stderr_buf.lock().to_string_lossy(),
  };

  let elapsed_ms = started.elapsed().as_millis() as u64;
  Ok(match status {
    Some(status) => {
      let code = status.code().unwrap_or(SIGNALED_EXIT_CODE);
      debug!(exit_code = code, elapsed_ms, "toolchain process exited");
      ProcessOutcome::Exited { code, console }
    }
    None => ProcessOutcome::TimedOut { console },
  })
}

/// Kill the child's process group, then the child itself.
fn kill_tree(child: &mut Child) {
  #[cfg(unix)]
  if let Some(pid) = child.id().and_then(|id| rustix::process::Pid::from_raw(id as i32)) {
    if let Err(e) = rustix::process::kill_process_group(pid, rustix::process::Signal::KILL) {
      debug!(pid = ?pid, error = %e, "failed to kill process group");
    }
  }

  if let Err(e) = child.start_kill() {
    debug!(error = %e, "failed to kill toolchain process");
  }
}

async fn drain<R>(reader: Option<R>, stream: &'static str, sink: Arc<Mutex<CappedBuffer>>) -> io::Result<()>
where
  R: AsyncRead + Unpin,
{
  let Some(mut reader) = reader else {
    return Ok(());
  };

  let mut chunk = vec![0u8; READ_CHUNK];
  loop {
    let n = reader.read(&mut chunk).await?;
    if n == 0 {
      return Ok(());
    }
    for line in String::from_utf8_lossy(&chunk[..n]).lines() {
      trace!(stream, line, "toolchain output");
    }
    sink.lock().push(&chunk[..n]);
  }
}

/// Wait for a drain task, giving up after [`DRAIN_GRACE`]. Whatever was read
/// so far stays in the shared buffer.
async fn finish_drain(mut task: JoinHandle<io::Result<()>>, stream: &'static str) -> io::Result<()> {
  match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
    Ok(Ok(result)) => result,
    Ok(Err(join)) => Err(io::Error::other(format!("{} drain task failed: {}", stream, join))),
    Err(_) => {
      warn!(stream, "output stream still open after process exit, abandoning drain");
      task.abort();
      Ok(())
    }
  }
}

/// Byte buffer that keeps the first `cap` bytes and counts the rest.
#[derive(Debug)]
struct CappedBuffer {
  data: Vec<u8>,
  cap: usize,
  dropped: usize,
}

impl CappedBuffer {
  fn new(cap: usize) -> Self {
    Self {
      data: Vec::new(),
      cap,
      dropped: 0,
    }
  }

  fn push(&mut self, bytes: &[u8]) {
    let room = self.cap.saturating_sub(self.data.len());
    let take = room.min(bytes.len());
    self.data.extend_from_slice(&bytes[..take]);
    self.dropped += bytes.len() - take;
  }

  fn to_string_lossy(&self) -> String {
    let mut text = String::from_utf8_lossy(&self.data).into_owned();
    if self.dropped > 0 {
      text.push_str(&format!("\n... [{} bytes truncated]", self.dropped));
    }
    text
  }
}
