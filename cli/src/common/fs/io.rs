//! # Distpack Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! This module centralizes fundamental filesystem input/output operations
//! required by the distpack application. It provides convenient, robust
//! wrappers around standard library `std::fs` functions.
//!
//! ## Architecture
//!
//! The module currently offers one focused utility function:
//! - **`read_file_to_string`**: A simple wrapper around `fs::read_to_string`
//!   that adds context to potential I/O errors using `anyhow::Context`.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::fs::io;
//! use crate::core::error::Result;
//! use std::path::Path;
//!
//! # fn run_example() -> Result<()> {
//! let ignore_file = Path::new("./.gitignore");
//! let contents = io::read_file_to_string(ignore_file)?;
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::Result;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads the entire contents of a file into a `String`.
///
/// # Arguments
///
/// * `path` - A `&Path` reference to the file to read.
///
/// # Returns
///
/// * `Result<String>` - The file contents on success.
///
/// # Errors
///
/// Returns an `Err` (with path context) if the file does not exist, is not
/// readable, or does not contain valid UTF-8.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    debug!("Reading file to string: {}", path.display());
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}
