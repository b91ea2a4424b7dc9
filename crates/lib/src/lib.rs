//! modelbuild-lib: build orchestration and deduplication for schema artifacts.
//!
//! This crate turns a set of schema artifacts (structural models, generated-code
//! descriptors and a behavioral glue file) into a validated `BuildResult`:
//! - `fingerprint`: deterministic content identity of an artifact set
//! - `key`: the `BuildKey` used to deduplicate concurrent requests
//! - `execute`: the `BuildExecutor` strategies (host process or sandboxed container)
//! - `coordinator`: single-flight execution per `BuildKey`
//! - `service`: the facade tying validation, keying and execution together

pub mod build;
pub mod config;
pub mod consts;
pub mod coordinator;
pub mod error;
pub mod execute;
pub mod fingerprint;
pub mod key;
pub mod service;
pub mod util;

pub use build::{Artifact, ArtifactPair, BuildFlags, BuildInput, BuildRequest, BuildResult, StagedFile};
pub use config::{ExecutorConfig, LocalToolchainConfig, SandboxConfig};
pub use coordinator::BuildCoordinator;
pub use error::BuildError;
pub use execute::{BuildExecutor, LocalProcessExecutor, SandboxedExecutor};
pub use key::BuildKey;
pub use service::BuildService;
