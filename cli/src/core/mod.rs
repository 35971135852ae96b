//! # Distpack Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the core infrastructure components that provide
//! foundational functionality for the distpack application. These components
//! handle configuration and error management.
//!
//! ## Architecture
//!
//! The core infrastructure consists of two key components:
//! - `config`: Loading and validation of the optional `distpack.toml` tuning file
//! - `error`: Error types and error handling utilities
//!
//! ## Usage
//!
//! Core infrastructure is imported by command handlers:
//!
//! ```rust
//! use crate::core::config; // For loading packaging configuration
//! use crate::core::error::{DistpackError, Result}; // For error handling
//! ```
//!
//! These modules provide foundational capabilities that are used across
//! different parts of the application, ensuring consistent behavior.
//!
pub mod config;
pub mod error;
