//! Build requests, inputs and results.
//!
//! A [`BuildRequest`] is what a caller submits: artifacts as they come out of
//! blob storage, possibly with a stored content hash and possibly without a
//! payload. Once validated it yields a [`crate::BuildKey`] for deduplication
//! and a [`BuildInput`], the privately owned byte copies one execution stages
//! into its work directory. Every execution ends in a [`BuildResult`].
//!
//! # Submodules
//!
//! - [`result`] - `BuildResult` and the toolchain's structured result file
//! - `types` - requests, artifacts and inputs

pub mod result;
mod types;

pub use result::{BuildResult, ResultFile};
pub use types::*;
