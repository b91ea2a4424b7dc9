//! CLI output formatting utilities.
//!
//! Status lines go to stdout (errors to stderr) with colors only when the
//! stream supports them, so JSON output and piped text stay clean.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
}

/// First 12 characters of a fingerprint.
pub fn truncate_hash(hash: &str) -> &str {
  match hash.char_indices().nth(12) {
    Some((idx, _)) => &hash[..idx],
    None => hash,
  }
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

/// Build failures are results, so they go to stdout with the rest of the summary.
pub fn print_failure(message: &str) {
  println!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()),
    message.if_supports_color(Stream::Stdout, |s| s.red())
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  println!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stdout, |s| s.yellow()),
    message.if_supports_color(Stream::Stdout, |s| s.yellow())
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
