use serde::{Deserialize, Serialize};

use crate::consts::ABSENT_CONTENT;
use crate::error::BuildError;
use crate::fingerprint::{Fingerprint, fingerprint};
use crate::key::BuildKey;
use crate::util::hash::{hash_bytes, is_content_hash};

/// One input file as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
  pub name: String,
  /// Raw bytes, absent when the blob could not be loaded.
  pub content: Option<Vec<u8>>,
  /// Content hash recorded by blob storage, trusted when present.
  pub content_hash: Option<String>,
}

impl Artifact {
  pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
    Self {
      name: name.into(),
      content: Some(content),
      content_hash: None,
    }
  }

  /// An artifact whose payload is missing.
  pub fn absent(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      content: None,
      content_hash: None,
    }
  }

  pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
    self.content_hash = Some(hash.into());
    self
  }

  /// The hash used in fingerprints: stored hash, else hash of the bytes,
  /// else the absent-content sentinel.
  pub fn effective_hash(&self) -> String {
    if let Some(stored) = self.content_hash.as_deref().filter(|h| !h.trim().is_empty()) {
      return stored.to_ascii_lowercase();
    }
    match &self.content {
      Some(bytes) => hash_bytes(bytes).0,
      None => ABSENT_CONTENT.to_string(),
    }
  }
}

/// Execution flags forwarded to the toolchain.
///
/// Flags change how the toolchain runs but not which artifacts it reads, so
/// they are not part of the fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFlags {
  /// Validate the artifacts without generating code.
  pub validate_only: bool,
  /// Treat warnings as errors.
  pub fail_on_warnings: bool,
}

impl BuildFlags {
  pub fn to_args(self) -> Vec<String> {
    let mut args = Vec::new();
    if self.validate_only {
      args.push("--validate-only".to_string());
    }
    if self.fail_on_warnings {
      args.push("--fail-on-warnings".to_string());
    }
    args
  }
}

/// A build request as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
  /// Requester scope, typically the user or session id.
  pub scope: String,
  /// Target project the built artifact belongs to.
  pub project_id: i64,
  /// Structural models, paired by position with `descriptors`.
  pub structural: Vec<Artifact>,
  /// Generated-code descriptors.
  pub descriptors: Vec<Artifact>,
  /// The behavioral glue file.
  pub glue: Artifact,
  #[serde(default)]
  pub flags: BuildFlags,
}

impl BuildRequest {
  /// Reject requests that can never be built, before anything is spawned.
  pub fn validate(&self) -> Result<(), BuildError> {
    if self.structural.is_empty() {
      return Err(BuildError::InvalidRequest("no structural models supplied".to_string()));
    }
    if self.descriptors.is_empty() {
      return Err(BuildError::InvalidRequest("no generated-code descriptors supplied".to_string()));
    }
    if self.structural.len() != self.descriptors.len() {
      return Err(BuildError::InvalidRequest(format!(
        "{} structural models but {} descriptors; each model needs exactly one descriptor",
        self.structural.len(),
        self.descriptors.len()
      )));
    }

    for artifact in self.structural.iter().chain(&self.descriptors).chain(std::iter::once(&self.glue)) {
      validate_file_name(&artifact.name)?;
      if artifact.content.is_none() {
        return Err(BuildError::InvalidRequest(format!(
          "artifact '{}' has no content",
          artifact.name
        )));
      }
      if let Some(hash) = &artifact.content_hash
        && !is_content_hash(&hash.to_ascii_lowercase())
      {
        return Err(BuildError::InvalidRequest(format!(
          "artifact '{}' has a malformed content hash",
          artifact.name
        )));
      }
    }

    Ok(())
  }

  pub fn fingerprint(&self) -> Fingerprint {
    fingerprint(&self.structural, &self.descriptors, &self.glue)
  }

  pub fn key(&self) -> Result<BuildKey, BuildError> {
    BuildKey::new(self.scope.clone(), self.project_id, self.fingerprint())
  }

  /// Copy the payloads into an input owned by a single execution.
  ///
  /// Pairs are ordered by file name so that requests sharing a key stage
  /// identical inputs regardless of upload order.
  pub fn to_input(&self) -> Result<BuildInput, BuildError> {
    self.validate()?;

    let mut pairs = self
      .structural
      .iter()
      .zip(&self.descriptors)
      .map(|(structural, descriptor)| {
        Ok(ArtifactPair {
          structural: StagedFile::from_artifact(structural)?,
          descriptor: StagedFile::from_artifact(descriptor)?,
        })
      })
      .collect::<Result<Vec<_>, BuildError>>()?;
    pairs.sort_by(|a, b| {
      (&a.structural.name, &a.descriptor.name).cmp(&(&b.structural.name, &b.descriptor.name))
    });

    Ok(BuildInput {
      project_id: self.project_id,
      pairs,
      glue: StagedFile::from_artifact(&self.glue)?,
      flags: self.flags,
    })
  }
}

/// A file name plus the bytes to write under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
  pub name: String,
  pub bytes: Vec<u8>,
}

impl StagedFile {
  pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
    Self {
      name: name.into(),
      bytes: bytes.into(),
    }
  }

  fn from_artifact(artifact: &Artifact) -> Result<Self, BuildError> {
    let bytes = artifact
      .content
      .clone()
      .ok_or_else(|| BuildError::InvalidRequest(format!("artifact '{}' has no content", artifact.name)))?;
    Ok(Self {
      name: artifact.name.clone(),
      bytes,
    })
  }
}

/// A structural model and its generated-code descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPair {
  pub structural: StagedFile,
  pub descriptor: StagedFile,
}

/// Everything one execution needs, owned exclusively by that execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInput {
  pub project_id: i64,
  pub pairs: Vec<ArtifactPair>,
  pub glue: StagedFile,
  pub flags: BuildFlags,
}

impl BuildInput {
  pub fn validate(&self) -> Result<(), BuildError> {
    if self.pairs.is_empty() {
      return Err(BuildError::InvalidRequest("no artifact pairs supplied".to_string()));
    }
    for pair in &self.pairs {
      validate_file_name(&pair.structural.name)?;
      validate_file_name(&pair.descriptor.name)?;
    }
    validate_file_name(&self.glue.name)
  }
}

/// Artifact names become file names inside the work directory, so they must
/// be a single plain path component.
pub fn validate_file_name(name: &str) -> Result<(), BuildError> {
  let invalid = |reason: &str| BuildError::InvalidRequest(format!("invalid artifact file name '{}': {}", name, reason));

  if name.trim().is_empty() {
    return Err(invalid("empty"));
  }
  if name == "." || name == ".." {
    return Err(invalid("reserved name"));
  }
  if name.contains(['/', '\\']) {
    return Err(invalid("contains a path separator"));
  }
  if name.contains('\0') {
    return Err(invalid("contains a NUL byte"));
  }
  if name.contains([';', ',']) {
    return Err(invalid("contains a list separator"));
  }
  Ok(())
}
