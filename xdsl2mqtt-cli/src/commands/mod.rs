//! Command handler modules for the CLI.

mod check;
mod parse;
mod probe;
mod run;

use std::path::PathBuf;

use xdsl2mqtt_core::{
    AppConfig, ConfigManager, TracingConfig, TracingLevel, TracingOutput, init_tracing,
};

use crate::cli::{Cli, Commands};
use crate::error::CliError;

/// Logging flags shared by every command
struct LogOptions {
    verbose: u8,
    quiet: bool,
    log_file: Option<PathBuf>,
}

impl LogOptions {
    /// Installs the subscriber; `RUST_LOG` replaces the derived directives
    fn init(&self, debug: bool) -> Result<(), CliError> {
        let mut config = TracingConfig::new()
            .with_level(TracingLevel::from_flags(debug, self.verbose, self.quiet));
        if let Some(path) = &self.log_file {
            config = config.with_output(TracingOutput::File { path: path.clone() });
        }
        if let Ok(filter) = std::env::var("RUST_LOG")
            && !filter.trim().is_empty()
        {
            config = config.with_filter(filter);
        }
        init_tracing(&config).map_err(|e| CliError::Logging(e.to_string()))
    }
}

/// Loads and validates the configuration, then starts logging with the
/// file's `debug` flag
fn load_config(
    config_path: Option<PathBuf>,
    logging: &LogOptions,
) -> Result<(ConfigManager, AppConfig), CliError> {
    let manager = ConfigManager::resolve(config_path)?;
    let config = manager.load()?;
    logging.init(config.general.debug)?;
    tracing::debug!(path = %manager.path().display(), "Configuration loaded");
    Ok((manager, config))
}

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(cli: Cli) -> Result<(), CliError> {
    let logging = LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_file: cli.log_file,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let (_, config) = load_config(cli.config, &logging)?;
            run::cmd_run(config)
        }
        Commands::Check => {
            let (manager, config) = load_config(cli.config, &logging)?;
            check::cmd_check(&manager, &config)
        }
        Commands::Probe => {
            let (_, config) = load_config(cli.config, &logging)?;
            probe::cmd_probe(&config)
        }
        Commands::Parse { kind, file, pretty } => {
            logging.init(false)?;
            parse::cmd_parse(kind, file.as_deref(), pretty)
        }
    }
}
