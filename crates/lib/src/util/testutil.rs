//! Test utilities for modelbuild-lib.
//!
//! Fake toolchains are plain `/bin/sh` scripts written into a temp directory.
//! They receive the same flags a real toolchain would and can be told to write
//! a result file, print to the console, sleep, or count their invocations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::build::{Artifact, BuildFlags, BuildRequest};
use crate::config::{ExecutorConfig, LocalToolchainConfig};

/// Writes `body` as an executable shell script and returns its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  let mut perms = std::fs::metadata(&path).unwrap().permissions();
  perms.set_mode(0o755);
  std::fs::set_permissions(&path, perms).unwrap();
  path
}

/// Config that runs `script` through `/bin/sh` with a private work root.
pub fn local_config(script: &Path, work_root: &Path, timeout: Duration) -> ExecutorConfig {
  ExecutorConfig {
    timeout_secs: timeout.as_secs().max(1),
    work_root: work_root.to_path_buf(),
    local: LocalToolchainConfig {
      program: Some(PathBuf::from("/bin/sh")),
      args: vec![script.display().to_string()],
    },
    ..ExecutorConfig::default()
  }
}

/// A request with one model/descriptor pair and a glue file.
pub fn sample_request(project_id: i64) -> BuildRequest {
  BuildRequest {
    scope: "alice".to_string(),
    project_id,
    structural: vec![Artifact::new("a.ecore", b"<ecore/>".to_vec())],
    descriptors: vec![Artifact::new("a.genmodel", b"<genmodel/>".to_vec())],
    glue: Artifact::new("r.reactions", b"reactions: a".to_vec()),
    flags: BuildFlags::default(),
  }
}

/// Number of entries left in a work root.
pub fn entries(dir: &Path) -> usize {
  std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

/// Shell snippet that writes a result file at the path given via `--result-file`.
pub fn result_file_script(json: &str) -> String {
  format!(
    r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--result-file" ]; then out="$2"; fi
  shift
done
cat > "$out" <<'JSON'
{}
JSON"#,
    json
  )
}
