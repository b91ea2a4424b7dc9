//! Loading artifacts from local files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use modelbuild_lib::Artifact;

/// Parse a `<model>,<descriptor>` pair argument.
pub fn parse_pair(value: &str) -> Result<(PathBuf, PathBuf), String> {
  match value.split_once(',') {
    Some((model, descriptor)) if !model.trim().is_empty() && !descriptor.trim().is_empty() => {
      Ok((PathBuf::from(model.trim()), PathBuf::from(descriptor.trim())))
    }
    _ => Err(format!("expected <model>,<descriptor>, got '{}'", value)),
  }
}

/// Read a file into an artifact named after the file.
pub fn load_artifact(path: &Path) -> Result<Artifact> {
  let name = path
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or_else(|| anyhow!("Not a file name: {}", path.display()))?;
  let content = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(Artifact::new(name, content))
}

/// Load structural and descriptor artifacts, keeping their pairing.
pub fn load_pairs(pairs: &[(PathBuf, PathBuf)]) -> Result<(Vec<Artifact>, Vec<Artifact>)> {
  let mut structural = Vec::with_capacity(pairs.len());
  let mut descriptors = Vec::with_capacity(pairs.len());
  for (model, descriptor) in pairs {
    structural.push(load_artifact(model)?);
    descriptors.push(load_artifact(descriptor)?);
  }
  Ok((structural, descriptors))
}
