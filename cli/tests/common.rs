//! # Distpack CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! This module provides shared utility functions used across the integration
//! test files. Integration tests are located in the `cli/tests/` directory
//! and each `.rs` file in that directory (that isn't a module like this one)
//! is compiled as a separate test crate linked against the main `distpack`
//! binary crate.
//!

// Allow potentially unused code in this common module, as different test files might use different helpers.
#![allow(dead_code)]

// Re-export common crates/modules needed by multiple test files
pub use assert_cmd::Command;

/// # Get Distpack Command (`distpack_cmd`)
///
/// Helper function to create an `assert_cmd::Command` instance pointing to
/// the compiled `distpack` binary target for the current test run.
///
/// This ensures tests execute the correct binary being built.
///
/// ## Panics
/// Panics if the `distpack` binary cannot be found via `Command::cargo_bin`.
///
/// ## Returns
/// * `Command` - An `assert_cmd::Command` ready to have arguments added and assertions run.
pub fn distpack_cmd() -> Command {
    Command::cargo_bin("distpack").expect("Failed to find distpack binary for testing")
}
