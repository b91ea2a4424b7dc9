//! Crate-wide constants shared by staging, execution and result interpretation.

/// Prefix of every per-build work directory.
pub const WORK_DIR_PREFIX: &str = "mbuild-";

/// Directory (relative to the work dir) holding one subdirectory per artifact pair.
pub const MODELS_DIR: &str = "models";

/// Directory (relative to the work dir) holding the behavioral glue file.
pub const GLUE_DIR: &str = "glue";

/// Directory (relative to the work dir) the toolchain writes its outputs into.
pub const OUTPUT_DIR: &str = "out";

/// Name of the structured result file inside [`OUTPUT_DIR`].
pub const RESULT_FILE: &str = "build-result.json";

/// Mount point of the staged work dir inside the sandbox container.
pub const SANDBOX_WORKSPACE: &str = "/workspace";

/// Marker placed at the start of the report of a build that hit its time limit.
pub const TIMEOUT_MARKER: &str = "[TIMEOUT]";

/// Marker placed at the start of the report of a build that crashed while
/// staging inputs or draining output.
pub const CRASH_MARKER: &str = "[CRASHED]";

/// Hash token used for an artifact whose byte payload is missing.
pub const ABSENT_CONTENT: &str = "<absent>";

/// Default wall-clock limit for a single build.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default cap on retained bytes per console stream.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// Exit code reported when the process was killed by a signal.
pub const SIGNALED_EXIT_CODE: i32 = -1;
