//! Shared helpers for library integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use modelbuild_lib::{
  Artifact, BuildExecutor, BuildFlags, BuildRequest, BuildService, ExecutorConfig, LocalProcessExecutor,
  LocalToolchainConfig,
};
use tempfile::TempDir;

/// A fake toolchain that records each invocation, waits a little so that
/// concurrent callers overlap, and writes a result file counting the pairs it saw.
pub const COUNTING_TOOLCHAIN: &str = r#"dir="$(dirname "$0")"
echo "$$" >> "$dir/invocations"
pairs=""; out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --pairs) pairs="$2" ;;
    --result-file) out="$2" ;;
  esac
  shift
done
sleep 1
count=$(echo "$pairs" | tr ';' '\n' | wc -l | tr -d ' ')
cat > "$out" <<JSON
{"success": true, "errors": 0, "warnings": 0, "report": "generated $count pair(s)", "nsUris": ["http://example.org/a"]}
JSON"#;

/// Isolated environment with a fake toolchain and its own work root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn with_toolchain(body: &str) -> Self {
    let temp = TempDir::new().unwrap();
    write_script(&temp.path().join("toolchain.sh"), body);
    Self { temp }
  }

  pub fn work_root(&self) -> PathBuf {
    self.temp.path().join("work")
  }

  pub fn config(&self, timeout: Duration) -> ExecutorConfig {
    ExecutorConfig {
      work_root: self.work_root(),
      local: LocalToolchainConfig {
        program: Some(PathBuf::from("/bin/sh")),
        args: vec![self.temp.path().join("toolchain.sh").display().to_string()],
      },
      ..ExecutorConfig::default()
    }
    .with_timeout(timeout)
  }

  pub fn service(&self) -> BuildService {
    let executor: Arc<dyn BuildExecutor> =
      Arc::new(LocalProcessExecutor::new(self.config(Duration::from_secs(30))).unwrap());
    BuildService::new(executor)
  }

  /// Number of times the toolchain was started.
  pub fn invocations(&self) -> usize {
    std::fs::read_to_string(self.temp.path().join("invocations"))
      .map(|s| s.lines().count())
      .unwrap_or(0)
  }

  /// Entries left behind in the work root.
  pub fn leftover_work_dirs(&self) -> usize {
    std::fs::read_dir(self.work_root()).map(|it| it.count()).unwrap_or(0)
  }
}

fn write_script(path: &Path, body: &str) {
  use std::os::unix::fs::PermissionsExt;

  std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  let mut perms = std::fs::metadata(path).unwrap().permissions();
  perms.set_mode(0o755);
  std::fs::set_permissions(path, perms).unwrap();
}

/// `a.ecore` + `a.genmodel` + `r.reactions` for `project_id`.
pub fn scenario_request(project_id: i64) -> BuildRequest {
  BuildRequest {
    scope: "alice".to_string(),
    project_id,
    structural: vec![Artifact::new("a.ecore", b"<ecore:EPackage name=\"a\"/>".to_vec())],
    descriptors: vec![Artifact::new(
      "a.genmodel",
      b"<genmodel:GenModel modelDirectory=\"/a\"/>".to_vec(),
    )],
    glue: Artifact::new("r.reactions", b"reactions: a2a in reaction to changes in a".to_vec()),
    flags: BuildFlags::default(),
  }
}
