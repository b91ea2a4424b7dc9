//! Request-level entry point.

use std::sync::Arc;

use tracing::debug;

use crate::build::{BuildRequest, BuildResult};
use crate::coordinator::BuildCoordinator;
use crate::error::BuildError;
use crate::execute::BuildExecutor;

/// Validates requests, keys them and runs each distinct build once.
#[derive(Clone)]
pub struct BuildService {
  coordinator: BuildCoordinator,
  executor: Arc<dyn BuildExecutor>,
}

impl BuildService {
  pub fn new(executor: Arc<dyn BuildExecutor>) -> Self {
    Self::with_coordinator(executor, BuildCoordinator::new())
  }

  /// Share an existing coordinator, e.g. between services using different executors.
  pub fn with_coordinator(executor: Arc<dyn BuildExecutor>, coordinator: BuildCoordinator) -> Self {
    Self { coordinator, executor }
  }

  pub fn coordinator(&self) -> &BuildCoordinator {
    &self.coordinator
  }

  /// Build `request`, or join an identical build that is already running.
  ///
  /// Invalid requests fail before any work is scheduled. Payloads are only
  /// copied for the execution that actually runs.
  pub async fn build(&self, request: BuildRequest) -> Result<Arc<BuildResult>, BuildError> {
    request.validate()?;
    let key = request.key()?;
    debug!(key = %key, pairs = request.structural.len(), "build requested");

    let executor = Arc::clone(&self.executor);
    self
      .coordinator
      .run_once_per_key(key, move || {
        let input = request.to_input();
        async move { executor.execute(input?).await }
      })
      .await
  }
}
