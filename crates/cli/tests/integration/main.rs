//! CLI integration tests against fake toolchains.

#![cfg(unix)]

mod build_tests;
mod common;
