//! `xdsl2mqtt` - polls a DSL modem over Telnet and publishes its line
//! statistics to an MQTT broker
//!
//! Besides the daemon loop, the binary can validate a configuration file,
//! run a single poll cycle to stdout, and parse captured command output.

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    let result = commands::dispatch(cli);

    if let Err(e) = result {
        if !quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
