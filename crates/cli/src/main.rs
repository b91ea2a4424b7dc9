mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildOptions, cmd_build, cmd_fingerprint};
use output::{OutputFormat, print_error};

/// mbuild - build and validate schema artifact sets
#[derive(Parser)]
#[command(name = "mbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct ArtifactArgs {
  /// Structural model and its descriptor, e.g. `a.ecore,a.genmodel` (repeatable)
  #[arg(long = "pair", value_name = "MODEL,DESCRIPTOR", value_parser = cmd::parse_pair, required = true)]
  pairs: Vec<(PathBuf, PathBuf)>,

  /// Behavioral glue file
  #[arg(long)]
  glue: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the fingerprint of a set of local artifacts
  Fingerprint {
    #[command(flatten)]
    artifacts: ArtifactArgs,

    /// Output format
    #[arg(short = 'o', long = "format", value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Build a set of local artifacts with the configured toolchain
  Build {
    #[command(flatten)]
    artifacts: ArtifactArgs,

    /// Target project id
    #[arg(long)]
    project: i64,

    /// Requester scope used for deduplication
    #[arg(long, default_value = "local")]
    scope: String,

    /// Run the toolchain inside the sandbox container
    #[arg(long)]
    sandbox: bool,

    /// Wall-clock limit, e.g. `90s` or `5m`
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// JSON config file (default: MBUILD_* environment variables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only validate, don't generate code
    #[arg(long)]
    validate_only: bool,

    /// Treat warnings as errors
    #[arg(long)]
    fail_on_warnings: bool,

    /// Output format
    #[arg(short = 'o', long = "format", value_enum, default_value_t)]
    format: OutputFormat,
  },
}

/// Exit status when the build ran and was rejected.
const EXIT_BUILD_FAILED: u8 = 1;
/// Exit status when no build could be run.
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Fingerprint { artifacts, format } => {
      cmd_fingerprint(&artifacts.pairs, &artifacts.glue, format).map(|()| true)
    }
    Commands::Build {
      artifacts,
      project,
      scope,
      sandbox,
      timeout,
      config,
      validate_only,
      fail_on_warnings,
      format,
    } => cmd_build(BuildOptions {
      pairs: artifacts.pairs,
      glue: artifacts.glue,
      project,
      scope,
      sandbox,
      timeout,
      config,
      validate_only,
      fail_on_warnings,
      format,
    }),
  };

  match result {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::from(EXIT_BUILD_FAILED),
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::from(EXIT_ERROR)
    }
  }
}
