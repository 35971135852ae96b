//! # Distpack Pack Command
//!
//! File: cli/src/commands/pack/mod.rs
//!
//! ## Overview
//!
//! This module implements the `distpack pack` command, which packages the
//! current working tree into a single distribution archive. The working tree
//! stays untouched; exclusion rules from the tree's ignore file and the
//! `.dist` override convention decide what the archive contains.
//!
//! ## Architecture
//!
//! The command flow follows these steps:
//! 1. Parse command arguments (destination path).
//! 2. Resolve the packaging root (the current working directory).
//! 3. Load the optional `distpack.toml` tuning configuration from the root.
//! 4. Build the exclusion rules from the root's ignore file (a missing file
//!    is a warning, not an error).
//! 5. Hand off to the tree walker, which owns the archive for the rest of
//!    the run: create, stream entries, periodic reopen cycles, final close.
//! 6. Print the confirmation message (always shown, regardless of verbosity).
//!
//! ## Examples
//!
//! Usage examples:
//!
//! ```bash
//! # Package the current tree
//! distpack pack ../release.tar
//!
//! # Same, with per-entry diagnostics on stderr
//! distpack -v pack ../release.tar
//! ```
//!
//! The destination must not already exist; an existing archive is never
//! overwritten.
//!
use crate::core::config;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};

mod excludes;
mod walker;

pub use excludes::ExcludeRules;

/// # Pack Arguments (`PackArgs`)
///
/// Defines the command-line arguments accepted by the `distpack pack`
/// subcommand. Uses the `clap` crate for parsing and validation.
#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Destination path for the archive. Must not already exist.
    file: PathBuf,
}

/// # Handle Pack Command (`handle_pack`)
///
/// The main handler function for the `distpack pack` command. It resolves the
/// packaging root, assembles the exclusion rules, and drives the tree walker.
///
/// ## Workflow:
/// 1. Logs the start and the parsed arguments.
/// 2. Resolves the packaging root from the current working directory.
/// 3. Loads `distpack.toml` from the root if present (reopen interval and
///    protected suffixes; defaults reproduce the reference behavior).
/// 4. Builds [`ExcludeRules`] and appends the root's ignore-file patterns.
/// 5. Calls `walker::pack_tree`, which owns the archive lifecycle.
/// 6. Prints the forced confirmation messages around the run.
///
/// ## Arguments
///
/// * `args`: The parsed `PackArgs` struct containing command-line options.
///
/// ## Returns
///
/// * `Result<()>`: Returns `Ok(())` when the walk completed and the archive
///   closed cleanly, or an `Err` describing the first fatal condition.
pub fn handle_pack(args: PackArgs) -> Result<()> {
    info!("Handling pack command...");
    debug!("Pack args: {:?}", args);

    let root = env::current_dir().context("Failed to get current directory")?;
    let cfg = config::load_config(&root).context("Failed to load distpack configuration")?;

    // Forced message: always shown, packaging can take a while on big trees.
    println!("Saving archive to {}, please wait", args.file.display());

    let mut rules = ExcludeRules::new();
    rules.load_ignore_file(&root);

    let summary = walker::pack_tree(&root, &args.file, &rules, &cfg)?;
    debug!(
        "Packed {} entries with {} reopen cycle(s)",
        summary.entries, summary.reopen_cycles
    );

    // Forced confirmation, shown regardless of verbosity.
    println!("Saved archive to {}", args.file.display());
    Ok(())
}
