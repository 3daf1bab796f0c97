// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start polling every configured device (default)
//! - `validate`: Validate the configuration file
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Federator - field-bus tag reader
///
/// Polls industrial devices and reports their register values as typed,
/// quality-annotated tag readings.
#[derive(Parser, Debug)]
#[command(
    name = "federator",
    author = "Sylvex <contact@sylvex.io>",
    version = federator_core::VERSION,
    about = "Field-bus tag reader",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "federator.yaml",
        env = "FEDERATOR_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "FEDERATOR_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "FEDERATOR_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Poll every configured device until interrupted
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses the file and builds every driver without connecting.
    Validate(ValidateArgs),

    /// Show version information
    Version,
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Stop after this many polling cycles per device
    #[arg(long)]
    pub cycles: Option<u64>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["federator"]);
        assert!(cli.command.is_none());
        assert!(matches!(
            cli.effective_command(),
            Commands::Run(ref args) if args.cycles.is_none()
        ));
    }

    #[test]
    fn test_run_cycles() {
        let cli = Cli::parse_from(["federator", "run", "--cycles", "3"]);
        match cli.command {
            Some(Commands::Run(args)) => assert_eq!(args.cycles, Some(3)),
            other => panic!("Expected Run command, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["federator", "validate", "-f", "json"]);
        match cli.command {
            Some(Commands::Validate(args)) => assert_eq!(args.format, OutputFormat::Json),
            other => panic!("Expected Validate command, got {:?}", other),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "federator",
            "validate",
            "-c",
            "/etc/federator/plant.yaml",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/federator/plant.yaml"));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_log_level_flags() {
        let cli = Cli::parse_from(["federator", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(), "trace");

        let cli = Cli::parse_from(["federator", "-q"]);
        assert_eq!(cli.effective_log_level(), "warn");

        let cli = Cli::parse_from(["federator", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");
    }
}
