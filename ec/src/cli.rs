//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Log file location shown in `--help`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("etl-cognition")
        .join("logs")
        .join("ec.log")
}

/// etl-cognition - PowerCenter workflow analyzer
#[derive(Debug, Parser)]
#[command(
    name = "ec",
    about = "Analyze PowerCenter XML exports: parse, analyze, map dependencies, summarize",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/etl-cognition/logs/ec.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Subcommand to execute; the demo runs when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the sample XML and analyze it (default)
    Run,

    /// Analyze an existing PowerCenter XML file
    Analyze {
        /// XML file to analyze
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write the sample PowerCenter XML without analyzing it
    Generate {
        /// Output file (defaults to the configured sample file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List previous analysis sessions
    Sessions,

    /// Start the HTTP API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
}
