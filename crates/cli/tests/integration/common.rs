//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own directory holding the artifacts, the fake
/// toolchain and the work root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Environment with `a.ecore`, `a.genmodel` and `r.reactions`.
  pub fn with_artifacts() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("a.ecore", "<ecore:EPackage name=\"a\"/>");
    env.write_file("a.genmodel", "<genmodel:GenModel/>");
    env.write_file("r.reactions", "reactions: a2a");
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Write the fake toolchain script.
  pub fn toolchain(&self, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = self.temp.path().join("toolchain.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
  }

  pub fn work_root(&self) -> PathBuf {
    self.temp.path().join("work")
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// mbuild command running in the temp dir, configured via environment.
  pub fn mbuild_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("mbuild");
    cmd
      .current_dir(self.temp.path())
      .env("MBUILD_TOOLCHAIN", self.temp.path().join("toolchain.sh"))
      .env("MBUILD_WORK_ROOT", self.work_root())
      .env_remove("MBUILD_TOOLCHAIN_ARGS")
      .env_remove("MBUILD_TIMEOUT_SECS")
      .env_remove("RUST_LOG");
    cmd
  }

  /// mbuild build with the default artifacts.
  pub fn build_cmd(&self) -> Command {
    let mut cmd = self.mbuild_cmd();
    cmd.args(["build", "--project", "7", "--pair", "a.ecore,a.genmodel", "--glue", "r.reactions"]);
    cmd
  }

  pub fn leftover_work_dirs(&self) -> usize {
    std::fs::read_dir(self.work_root()).map(|it| it.count()).unwrap_or(0)
  }
}

/// Shell snippet writing `json` to the path passed via `--result-file`.
pub fn write_result(json: &str) -> String {
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
