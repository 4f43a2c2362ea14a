// src/cli.rs

//! CLI argument parsing using `clap`.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runbox`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runbox",
    version,
    about = "Run project files and shell commands on behalf of authenticated users, streaming their output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Runbox.toml` in the current working directory. A missing
    /// default file is not an error; a missing explicit file is.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding `[server].listen`.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNBOX_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config, print it, but don't start the server.
    #[arg(long)]
    pub dry_run: bool,

    /// Print a bearer token for OWNER signed with the configured secret and exit.
    #[arg(long, value_name = "OWNER")]
    pub issue_token: Option<String>,

    /// Lifetime of a token minted with `--issue-token`.
    #[arg(long, value_name = "DURATION", default_value = "24h")]
    pub token_ttl: String,
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
