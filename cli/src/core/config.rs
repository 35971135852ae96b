//! # Distpack Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements the configuration system for distpack, handling
//! loading, validation, and access to the packaging tuning knobs. The knobs
//! are deliberately few: the packaging behavior itself (which entries are
//! included, how overrides resolve) is driven by the tree's ignore file, not
//! by configuration.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `distpack.toml` at the root of the tree being packaged
//! 2. Default values defined in the code
//!
//! The defaults reproduce the reference behavior exactly; the file only exists
//! so the constants can be adjusted without a rebuild. An absent file is the
//! normal case and loads pure defaults.
//!
//! ## Examples
//!
//! Loading and using configuration:
//!
//! ```rust
//! let cfg = config::load_config(root)?;
//!
//! let interval = cfg.reopen_interval; // 200 unless overridden
//! let protected = &cfg.keep_suffixes; // [".htaccess"] unless overridden
//! ```
//!
//! The configuration is loaded once per command execution and passed
//! to the modules that need it.
//!
use crate::core::error::{DistpackError, Result};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Name of the optional per-tree configuration file, looked up at the root of
/// the tree being packaged.
const CONFIG_FILENAME: &str = "distpack.toml";

/// Packaging configuration, loaded from `distpack.toml` when present.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Number of archive adds between transparent close/reopen cycles of the
    /// archive handle. Must be at least 1.
    #[serde(default = "default_reopen_interval")]
    pub reopen_interval: usize,
    /// Short-name suffixes that force inclusion even when an exclude pattern
    /// matches the entry.
    #[serde(default = "default_keep_suffixes")]
    pub keep_suffixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reopen_interval: default_reopen_interval(),
            keep_suffixes: default_keep_suffixes(),
        }
    }
}

fn default_reopen_interval() -> usize {
    // Long archive-writer sessions can exhaust file descriptors; cycling the
    // handle every 200 adds keeps the session healthy on very large trees.
    200
}

fn default_keep_suffixes() -> Vec<String> {
    vec![".htaccess".to_string()]
}

/// Loads the packaging configuration for the tree rooted at `root`.
///
/// Reads `<root>/distpack.toml` if it exists, otherwise returns defaults.
/// The parsed configuration is validated before being returned.
///
/// # Errors
///
/// Returns an `Err` if the file exists but cannot be read, fails to parse as
/// TOML, or fails validation (e.g. a zero reopen interval).
pub fn load_config(root: &Path) -> Result<Config> {
    let config_path = root.join(CONFIG_FILENAME);
    let cfg = if config_path.exists() {
        info!("Loading configuration from: {}", config_path.display());
        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?
    } else {
        debug!(
            "No configuration file found at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };
    validate_config(&cfg)?;
    debug!("Final loaded configuration: {:?}", cfg);
    Ok(cfg)
}

/// Validates semantic constraints the type system cannot express.
fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.reopen_interval == 0 {
        return Err(DistpackError::Config(
            "reopen_interval must be at least 1".to_string(),
        ))?;
    }
    Ok(())
}
