//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Publish DSL modem line statistics to MQTT
#[derive(Parser)]
#[command(name = "xdsl2mqtt")]
#[command(author, version, about = "Publish DSL modem line statistics to MQTT")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "XDSL2MQTT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Command to run (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Poll the modem and publish until interrupted
    #[command(about = "Poll the modem and publish to MQTT until interrupted")]
    Run,

    /// Validate the configuration file
    #[command(about = "Load and validate the configuration, then print a summary")]
    Check,

    /// Run one poll cycle and print the records
    #[command(about = "Run one poll cycle and print the records instead of publishing")]
    Probe,

    /// Parse captured command output
    #[command(about = "Parse captured modem command output and print it as JSON")]
    Parse {
        /// Which command produced the output
        #[arg(short, long, value_enum)]
        kind: RecordKind,

        /// File holding the output (stdin when omitted)
        file: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

/// Command output understood by `parse`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    /// `xdslctl info --stats`
    Stats,
    /// `ifconfig <interface>`
    Interface,
}
