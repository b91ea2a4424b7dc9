//! End-to-end tests of the build service against fake toolchains.

#![cfg(unix)]

mod common;
mod dedup_tests;
mod executor_tests;
