//! Error types for build orchestration.
//!
//! Only conditions that mean "the infrastructure failed" or "the request was
//! malformed" are errors. A build that ran and was rejected, timed out or
//! crashed while staging is an ordinary [`crate::BuildResult`] with
//! `success == false`.

use thiserror::Error;

/// Errors surfaced by the build subsystem.
///
/// Messages are carried as strings so that one failure can be cloned and
/// delivered to every caller attached to the same in-flight build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// A `BuildKey` component was missing or blank.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// The request was rejected before any process was spawned.
  #[error("invalid build request: {0}")]
  InvalidRequest(String),

  /// The toolchain could not be started or is not configured.
  #[error("toolchain unavailable: {message}")]
  ToolchainUnavailable { message: String },

  /// The task running the build panicked or was cancelled by the runtime.
  #[error("build aborted: {0}")]
  Aborted(String),
}

impl BuildError {
  pub fn toolchain(message: impl Into<String>) -> Self {
    BuildError::ToolchainUnavailable {
      message: message.into(),
    }
  }

  /// Returns true for errors caused by the environment rather than the request.
  pub fn is_infrastructure(&self) -> bool {
    matches!(self, BuildError::ToolchainUnavailable { .. } | BuildError::Aborted(_))
  }
}
