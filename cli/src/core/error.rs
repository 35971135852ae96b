//! # Distpack Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types and error handling mechanisms used
//! throughout the distpack application. It provides a consistent approach to
//! error management with detailed error information and context.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `DistpackError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover the failure modes of a packaging run:
//! - Archive lifecycle failures (create / close / reopen)
//! - Archive content conflicts (name collisions, unsupported overrides)
//! - Per-file add failures
//! - Configuration errors
//!
//! Every one of these conditions is fatal: the walk stops on the first error
//! and the partial archive is left as-is. The only recoverable condition in
//! the whole run, a missing ignore file, is a logged warning, not an error.
//!
//! ## Examples
//!
//! Using the error system:
//!
//! ```rust
//! // Return a specific error type
//! if path.exists() {
//!     return Err(DistpackError::DestinationExists { path: path.to_path_buf() })?;
//! }
//!
//! // Add context to errors using anyhow
//! let content = fs::read_to_string(&path)
//!     .with_context(|| format!("Failed to read file: {}", path.display()))?;
//!
//! // Pattern matching on error types
//! match result {
//!     Ok(()) => println!("Packed."),
//!     Err(e) if e.downcast_ref::<DistpackError>().is_some_and(|de| matches!(de, DistpackError::NameCollision { .. })) => {
//!         eprintln!("duplicate archive entry");
//!     }
//!     Err(e) => return Err(e),
//! }
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for the distpack application.
#[derive(Error, Debug)]
pub enum DistpackError {
    #[error("Archive '{path}' already exists. Won't overwrite.")]
    DestinationExists { path: PathBuf },

    #[error("Can't create archive '{path}': {source}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Closing archive '{path}' failed: {source}")]
    ArchiveClose {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reopening archive '{path}' for append failed: {source}")]
    ArchiveReopen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{name}' already exists in archive")]
    NameCollision { name: String },

    #[error("Cannot use {suffix}-suffixed directories: '{name}'")]
    OverrideDirectory { name: String, suffix: &'static str },

    #[error("Couldn't add '{name}' -- probably too many open files: {source}")]
    FileAdd {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
/// Anyhow allows for easy context addition and flexible error handling.
pub type Result<T> = anyhow::Result<T>;
