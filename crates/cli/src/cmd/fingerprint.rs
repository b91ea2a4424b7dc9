//! Implementation of the `mbuild fingerprint` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use modelbuild_lib::fingerprint::fingerprint;

use super::inputs::{load_artifact, load_pairs};
use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
struct FingerprintOutput {
  fingerprint: String,
  pairs: usize,
}

pub fn cmd_fingerprint(pairs: &[(PathBuf, PathBuf)], glue: &Path, format: OutputFormat) -> Result<()> {
  let (structural, descriptors) = load_pairs(pairs)?;
  let glue = load_artifact(glue)?;

  let fingerprint = fingerprint(&structural, &descriptors, &glue);

  if format.is_json() {
    print_json(&FingerprintOutput {
      fingerprint: fingerprint.into(),
      pairs: pairs.len(),
    })?;
  } else {
    println!("{}", fingerprint);
  }

  Ok(())
}
