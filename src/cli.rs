// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `resflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "resflow",
    version,
    about = "Incrementally copy and filter project resources into module outputs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    ///
    /// Default: `Resflow.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Resflow.toml")]
    pub config: String,

    /// Only process the named unit. May be repeated.
    ///
    /// Units outside the selection keep their recorded outputs untouched.
    #[arg(long = "unit", value_name = "NAME")]
    pub units: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RESFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Discover and diff, print the plan, but don't touch any output.
    #[arg(long)]
    pub dry_run: bool,

    /// Keep running and re-process whenever a resource root changes.
    #[arg(long, conflicts_with = "dry_run")]
    pub watch: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
