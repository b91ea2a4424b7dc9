//! Build results and the toolchain's structured result file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{CRASH_MARKER, TIMEOUT_MARKER};

/// Outcome of one build execution.
///
/// Always complete: either a success or a failure with at least a report.
/// A single instance is shared by every caller attached to the execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
  pub success: bool,
  pub error_count: u32,
  pub warning_count: u32,
  pub report: String,
  pub discovered_namespaces: Vec<String>,
}

impl BuildResult {
  pub fn succeeded(report: impl Into<String>) -> Self {
    Self {
      success: true,
      error_count: 0,
      warning_count: 0,
      report: report.into(),
      discovered_namespaces: Vec::new(),
    }
  }

  /// A failure with a single error.
  pub fn failed(report: impl Into<String>) -> Self {
    Self {
      success: false,
      error_count: 1,
      warning_count: 0,
      report: report.into(),
      discovered_namespaces: Vec::new(),
    }
  }

  /// The build exceeded its time limit and was killed.
  pub fn timed_out(limit: Duration, console: &str) -> Self {
    let mut report = format!(
      "{} build exceeded the {}s time limit and was terminated",
      TIMEOUT_MARKER,
      limit.as_secs_f64()
    );
    if !console.trim().is_empty() {
      report.push_str("\n\n");
      report.push_str(console.trim_end());
    }
    Self::failed(report)
  }

  /// Staging or draining failed after the toolchain was available.
  pub fn crashed(message: impl std::fmt::Display) -> Self {
    Self::failed(format!("{} {}", CRASH_MARKER, message))
  }

  pub fn is_timeout(&self) -> bool {
    !self.success && self.report.starts_with(TIMEOUT_MARKER)
  }

  /// Discovered namespace URIs joined with `", "`.
  pub fn namespaces_joined(&self) -> String {
    self.discovered_namespaces.join(", ")
  }
}

/// The JSON document a toolchain writes when file-based reporting is enabled.
///
/// ```json
/// { "success": false, "errors": 2, "warnings": 0, "report": "...", "nsUris": ["http://a"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFile {
  pub success: bool,
  #[serde(default)]
  pub errors: Option<i64>,
  #[serde(default)]
  pub warnings: Option<i64>,
  #[serde(default)]
  pub report: Option<String>,
  #[serde(default, rename = "nsUris")]
  pub ns_uris: Option<Vec<String>>,
}

impl ResultFile {
  pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }
}

/// Null or negative counts read as zero.
fn count(value: Option<i64>) -> u32 {
  u32::try_from(value.unwrap_or(0).max(0)).unwrap_or(u32::MAX)
}

impl From<ResultFile> for BuildResult {
  fn from(file: ResultFile) -> Self {
    Self {
      success: file.success,
      error_count: count(file.errors),
      warning_count: count(file.warnings),
      report: file.report.unwrap_or_default(),
      discovered_namespaces: file.ns_uris.unwrap_or_default(),
    }
  }
}
