//! # Distpack Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the distpack CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! The application follows a modular command structure:
//! - Each top-level command (`pack`, ...) is defined as a variant in the `Commands` enum
//! - Commands are mapped to handler functions in their respective modules
//! - All errors are propagated to this level for consistent handling
//!
//! ## Examples
//!
//! Basic distpack usage:
//!
//! ```bash
//! # Get help
//! distpack --help
//!
//! # Package the current tree into release.tar, with per-entry diagnostics
//! distpack -v pack release.tar
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level
//! 3. Route to appropriate command handler
//! 4. Format and display any errors that occur
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

// Declare the top-level modules of the CLI crate.
mod commands; // Handles specific command logic (pack, etc.)
mod common; // Contains shared utilities (archive backend, fs helpers)
mod core; // Core infrastructure (errors, config)

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "distpack",
    about = "Packages a project source tree into a single distribution archive",
    long_about = "Walks the current tree, applies the ignore-file exclusion rules and the\n\
                  `.dist` template-override convention, and streams the result into one\n\
                  archive file ready to ship.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "p")]
    Pack(commands::pack::PackArgs),
}

fn main() -> anyhow::Result<()> {
    // Use anyhow::Result directly
    let cli = Cli::parse();

    // Map the repeatable `-v` flag onto log levels. The default level keeps
    // only forced messages (warnings and the final confirmation) visible;
    // `-v` surfaces the per-entry classification diagnostics.
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Pack(args) => commands::pack::handle_pack(args),
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
