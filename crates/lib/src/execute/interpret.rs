//! Turning a finished process into a `BuildResult`.
//!
//! Priority for a process that exited on its own:
//! 1. a parseable structured result file is trusted verbatim;
//! 2. otherwise exit code 0 is a success reporting the console text;
//! 3. otherwise it is a failure reporting stderr (or stdout if stderr is blank).

use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::build::{BuildResult, ResultFile};
use crate::execute::process::ConsoleOutput;

/// Interpret an exited process, consulting the result file first.
pub async fn interpret_exit(code: i32, console: &ConsoleOutput, result_file: &Path) -> BuildResult {
  if let Some(result) = read_result_file(result_file).await {
    debug!(exit_code = code, success = result.success, "using structured result file");
    return result;
  }
  interpret_console(code, console)
}

/// Interpretation without a result file.
pub fn interpret_console(code: i32, console: &ConsoleOutput) -> BuildResult {
  if code == 0 {
    return BuildResult::succeeded(console.combined());
  }

  let text = console.preferring_stderr();
  if text.trim().is_empty() {
    BuildResult::failed(format!("toolchain exited with code {} and produced no output", code))
  } else {
    BuildResult::failed(text)
  }
}

/// Returns `None` when the file is absent or unusable.
async fn read_result_file(path: &Path) -> Option<BuildResult> {
  let content = match tokio::fs::read_to_string(path).await {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
    Err(e) => {
      warn!(path = ?path, error = %e, "failed to read result file, falling back to console output");
      return None;
    }
  };

  match ResultFile::parse(&content) {
    Ok(file) => Some(file.into()),
    Err(e) => {
      warn!(path = ?path, error = %e, "malformed result file, falling back to console output");
      None
    }
  }
}
