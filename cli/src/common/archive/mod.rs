//! # Distpack Archive Utilities Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! This module serves as the main interface for archive-related functionality
//! within the distpack CLI. It houses the streaming backend that the tree
//! walk drives: one archive file is created up front, entries are appended as
//! the walk discovers them, and the handle is transparently cycled
//! (closed and reopened for append) on a fixed cadence so very large trees do
//! not exhaust file descriptors.
//!
//! ## Architecture
//!
//! The module contains one submodule:
//!
//! - **`tar`**: The `TarBackend` type, implementing the backend contract over
//!   the `tar` crate: create-new, add file, add empty directory, query
//!   whether a target name was added, close, and close+reopen cycling.
//!
//! The contract is format-agnostic; any streaming container that can append
//! entries under caller-chosen names and reopen an existing archive without
//! truncating it could stand in for the tar implementation.
//!
pub mod tar;
