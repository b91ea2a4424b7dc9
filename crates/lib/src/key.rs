//! Deduplication identity of a build request.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Identity tuple (requester scope, target project, fingerprint).
///
/// Two requests share an in-flight build only when all three components are
/// equal. Fields are private so a key can't be mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildKey {
  scope: String,
  project_id: i64,
  fingerprint: String,
}

impl BuildKey {
  /// Create a key, rejecting blank components with [`BuildError::InvalidArgument`].
  pub fn new(scope: impl Into<String>, project_id: i64, fingerprint: impl Into<String>) -> Result<Self, BuildError> {
    let scope = scope.into();
    let fingerprint = fingerprint.into();

    if scope.trim().is_empty() {
      return Err(BuildError::InvalidArgument("build key scope is missing".to_string()));
    }
    if fingerprint.trim().is_empty() {
      return Err(BuildError::InvalidArgument("build key fingerprint is missing".to_string()));
    }

    Ok(Self {
      scope,
      project_id,
      fingerprint,
    })
  }

  /// Create a key from optional parts, as they arrive from a request.
  pub fn from_parts(scope: Option<&str>, project_id: Option<i64>, fingerprint: Option<&str>) -> Result<Self, BuildError> {
    let scope = scope.ok_or_else(|| BuildError::InvalidArgument("build key scope is missing".to_string()))?;
    let project_id =
      project_id.ok_or_else(|| BuildError::InvalidArgument("build key project id is missing".to_string()))?;
    let fingerprint =
      fingerprint.ok_or_else(|| BuildError::InvalidArgument("build key fingerprint is missing".to_string()))?;
    Self::new(scope, project_id, fingerprint)
  }

  pub fn scope(&self) -> &str {
    &self.scope
  }

  pub fn project_id(&self) -> i64 {
    self.project_id
  }

  pub fn fingerprint(&self) -> &str {
    &self.fingerprint
  }
}

impl std::fmt::Display for BuildKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let short: String = self.fingerprint.chars().take(12).collect();
    write!(f, "{}/{}/{}", self.scope, self.project_id, short)
  }
}
