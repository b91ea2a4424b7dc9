//! Hashing utilities for content identity.
//!
//! Every hash in this crate is a full, lowercase, 64-character SHA-256 hex
//! digest. Artifact contents are hashed with [`hash_bytes`]; fingerprints hash
//! the canonical token string built in [`crate::fingerprint`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A full 64-character SHA-256 hash of some content.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl AsRef<str> for ContentHash {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}

/// Hash the UTF-8 encoding of a string.
pub fn hash_str(data: &str) -> ContentHash {
  hash_bytes(data.as_bytes())
}

/// Returns true if `value` looks like a hash produced by this module.
pub fn is_content_hash(value: &str) -> bool {
  value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
