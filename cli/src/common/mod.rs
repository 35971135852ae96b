//! # Distpack Shared Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! This module aggregates shared utility functionality used by the command
//! modules. It groups the archive backend and small filesystem helpers under
//! a single namespace so command code depends on one stable interface.
//!
//! ## Architecture
//!
//! Functionality is delegated to the following submodules:
//!
//! - **`archive`**: The streaming archive backend (create, add entries,
//!   close/reopen cycling) that the packaging walk drives.
//! - **`fs`**: Basic filesystem helpers (reading text files with error
//!   context) used when loading the ignore source.
//!
pub mod archive;
pub mod fs;
