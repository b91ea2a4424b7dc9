//! Deterministic content identity of a build's input set.
//!
//! Each artifact becomes a `name@sha256` token. Structural and descriptor
//! tokens are sorted by file name (then hash, so duplicate names with
//! different content still sort deterministically), joined with `;`, and the
//! three categories are joined with `|` under fixed labels:
//!
//! ```text
//! structural=a.ecore@<hash>;b.ecore@<hash>|descriptor=a.genmodel@<hash>|glue=r.reactions@<hash>
//! ```
//!
//! The fingerprint is the SHA-256 of that string. Upload order never matters,
//! file names and contents always do.

use serde::{Deserialize, Serialize};

use crate::build::Artifact;
use crate::util::hash::hash_str;

const STRUCTURAL_LABEL: &str = "structural";
const DESCRIPTOR_LABEL: &str = "descriptor";
const GLUE_LABEL: &str = "glue";

/// Lowercase hex SHA-256 identifying an artifact set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<Fingerprint> for String {
  fn from(value: Fingerprint) -> Self {
    value.0
  }
}

/// Compute the fingerprint of an artifact set.
///
/// Pure and infallible: empty categories produce empty segments and artifacts
/// without a payload hash to a sentinel token.
pub fn fingerprint(structural: &[Artifact], descriptors: &[Artifact], glue: &Artifact) -> Fingerprint {
  Fingerprint(hash_str(&canonical_form(structural, descriptors, glue)).0)
}

/// The canonical string that [`fingerprint`] hashes.
pub fn canonical_form(structural: &[Artifact], descriptors: &[Artifact], glue: &Artifact) -> String {
  format!(
    "{}={}|{}={}|{}={}",
    STRUCTURAL_LABEL,
    sorted_segment(structural),
    DESCRIPTOR_LABEL,
    sorted_segment(descriptors),
    GLUE_LABEL,
    token(&glue.name, &glue.effective_hash()),
  )
}

fn sorted_segment(artifacts: &[Artifact]) -> String {
  let mut entries: Vec<(&str, String)> = artifacts
    .iter()
    .map(|a| (a.name.as_str(), a.effective_hash()))
    .collect();
  entries.sort();

  entries
    .iter()
    .map(|(name, hash)| token(name, hash))
    .collect::<Vec<_>>()
    .join(";")
}

fn token(name: &str, hash: &str) -> String {
  format!("{}@{}", name, hash)
}
