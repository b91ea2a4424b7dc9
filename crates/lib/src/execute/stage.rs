//! Per-build work directories.
//!
//! Layout of a staged build (paths relative to the work dir):
//!
//! ```text
//! models/0/<structural name>
//! models/0/<descriptor name>
//! models/1/...
//! glue/<glue name>
//! out/build-result.json      (written by the toolchain)
//! ```
//!
//! Each pair gets its own directory so a descriptor's relative reference to
//! its model resolves and equal names in different pairs never collide. No
//! artifact is written at the top level, so no artifact name can clash with
//! the layout itself.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};

use crate::build::BuildInput;
use crate::consts::{GLUE_DIR, MODELS_DIR, OUTPUT_DIR, RESULT_FILE, WORK_DIR_PREFIX};
use crate::error::BuildError;

/// Where each staged artifact lives, relative to the work dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedLayout {
  pub pairs: Vec<(PathBuf, PathBuf)>,
  pub glue: PathBuf,
  pub result_file: PathBuf,
}

impl StagedLayout {
  /// Deterministic layout for an input.
  pub fn for_input(input: &BuildInput) -> Self {
    let pairs = input
      .pairs
      .iter()
      .enumerate()
      .map(|(idx, pair)| {
        let dir = Path::new(MODELS_DIR).join(idx.to_string());
        (dir.join(&pair.structural.name), dir.join(&pair.descriptor.name))
      })
      .collect();

    Self {
      pairs,
      glue: Path::new(GLUE_DIR).join(&input.glue.name),
      result_file: Path::new(OUTPUT_DIR).join(RESULT_FILE),
    }
  }
}

/// A uniquely named, private work directory, removed by [`WorkDir::teardown`].
#[derive(Debug)]
pub struct WorkDir {
  dir: TempDir,
}

impl WorkDir {
  /// Create a fresh work directory under `root`, creating `root` if needed.
  pub fn create(root: &Path) -> Result<Self, BuildError> {
    std::fs::create_dir_all(root)
      .map_err(|e| BuildError::toolchain(format!("cannot create work root {}: {}", root.display(), e)))?;

    let dir = tempfile::Builder::new()
      .prefix(WORK_DIR_PREFIX)
      .tempdir_in(root)
      .map_err(|e| BuildError::toolchain(format!("cannot create work directory in {}: {}", root.display(), e)))?;

    debug!(work_dir = ?dir.path(), "created work directory");
    Ok(Self { dir })
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  /// Directory name, unique among live builds.
  pub fn name(&self) -> String {
    self
      .dir
      .path()
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| WORK_DIR_PREFIX.trim_end_matches('-').to_string())
  }

  pub fn result_file(&self) -> PathBuf {
    self.path().join(OUTPUT_DIR).join(RESULT_FILE)
  }

  /// Write every artifact of `input` into the directory.
  pub async fn stage(&self, input: &BuildInput) -> io::Result<StagedLayout> {
    let layout = StagedLayout::for_input(input);
    let root = self.path();

    for (pair, (structural, descriptor)) in input.pairs.iter().zip(&layout.pairs) {
      if let Some(parent) = structural.parent() {
        fs::create_dir_all(root.join(parent)).await?;
      }
      fs::write(root.join(structural), &pair.structural.bytes).await?;
      fs::write(root.join(descriptor), &pair.descriptor.bytes).await?;
    }
    fs::create_dir_all(root.join(GLUE_DIR)).await?;
    fs::write(root.join(&layout.glue), &input.glue.bytes).await?;
    fs::create_dir_all(root.join(OUTPUT_DIR)).await?;

    debug!(work_dir = ?root, pairs = layout.pairs.len(), "staged build inputs");
    Ok(layout)
  }

  /// Recursively delete the directory. Failures are logged, never returned.
  pub fn teardown(self) {
    let path = self.dir.path().to_path_buf();
    match self.dir.close() {
      Ok(()) => debug!(work_dir = ?path, "removed work directory"),
      Err(e) => warn!(work_dir = ?path, error = %e, "failed to remove work directory"),
    }
  }
}
