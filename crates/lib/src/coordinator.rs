//! Single-flight execution per [`BuildKey`].
//!
//! The first caller for a key starts the build; every caller that arrives
//! while it is running attaches to the same execution and receives the same
//! `Arc<BuildResult>` (or the same error). The entry is evicted as soon as the
//! execution settles, so a later request with an equal key builds again.
//!
//! The build itself runs on a spawned task. It completes even if every caller
//! stops waiting, and its eviction guard runs on success, error and panic.
//! The map lock is never held while the guard can drop: the entry is inserted
//! under the lock, and the task is spawned after it is released.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::build::BuildResult;
use crate::error::BuildError;
use crate::key::BuildKey;

type Outcome = Result<Arc<BuildResult>, BuildError>;
type SharedBuild = Shared<BoxFuture<'static, Outcome>>;
type InFlight = Arc<Mutex<HashMap<BuildKey, SharedBuild>>>;

/// Deduplicates concurrent builds with equal keys.
///
/// Cloning is cheap and clones share the same in-flight map.
#[derive(Clone, Default)]
pub struct BuildCoordinator {
  inflight: InFlight,
}

impl BuildCoordinator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run `work` once for `key`, or wait for the execution already running.
  ///
  /// `work` is only called by the caller that starts the execution, and the
  /// future it returns is spawned onto the current Tokio runtime.
  pub async fn run_once_per_key<F, Fut>(&self, key: BuildKey, work: F) -> Outcome
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<BuildResult, BuildError>> + Send + 'static,
  {
    let runtime = Handle::try_current().map_err(|e| BuildError::Aborted(e.to_string()))?;

    let (shared, leader) = {
      let mut inflight = self.inflight.lock();
      match inflight.get(&key) {
        Some(existing) => {
          info!(key = %key, "attached to in-flight build");
          (existing.clone(), None)
        }
        None => {
          info!(key = %key, "starting build");
          let (tx, rx) = oneshot::channel();
          let shared = settled(rx);
          inflight.insert(key.clone(), shared.clone());
          (shared, Some(tx))
        }
      }
    };

    if let Some(tx) = leader {
      self.spawn(&runtime, key, tx, work);
    }

    shared.await
  }

  /// Number of keys with a running execution.
  pub fn in_flight(&self) -> usize {
    self.inflight.lock().len()
  }

  pub fn is_in_flight(&self, key: &BuildKey) -> bool {
    self.inflight.lock().contains_key(key)
  }

  fn spawn<F, Fut>(&self, runtime: &Handle, key: BuildKey, tx: oneshot::Sender<Outcome>, work: F)
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<BuildResult, BuildError>> + Send + 'static,
  {
    // Dropped with the task if the runtime refuses it, which also drops `tx`.
    let guard = Evict {
      inflight: Arc::clone(&self.inflight),
      key,
    };
    let work = work();

    runtime.spawn(async move {
      let result = match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result.map(Arc::new),
        Err(panic) => {
          let message = panic_message(panic.as_ref());
          error!(key = %guard.key, panic = %message, "build task panicked");
          Err(BuildError::Aborted(format!("build task panicked: {}", message)))
        }
      };
      // Evict before publishing so a settled caller never sees a stale entry.
      drop(guard);
      let _ = tx.send(result);
    });
  }
}

/// The waiter side of a build: resolves when the task publishes its outcome,
/// or with `Aborted` if the task is dropped without publishing.
fn settled(rx: oneshot::Receiver<Outcome>) -> SharedBuild {
  async move {
    rx.await
      .unwrap_or_else(|_| Err(BuildError::Aborted("build task ended without a result".to_string())))
  }
  .boxed()
  .shared()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(s) = panic.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}

/// Removes the key from the in-flight map when the build task ends.
struct Evict {
  inflight: InFlight,
  key: BuildKey,
}

impl Drop for Evict {
  fn drop(&mut self) {
    self.inflight.lock().remove(&self.key);
    debug!(key = %self.key, "evicted build");
  }
}
