//! Check command: validate the configuration and print what it resolves to.

use std::io::Write;
use std::path::Path;

use xdsl2mqtt_core::publish::BrokerAddress;
use xdsl2mqtt_core::{AppConfig, ConfigManager};

use crate::error::CliError;

/// Execute the check command
pub fn cmd_check(manager: &ConfigManager, config: &AppConfig) -> Result<(), CliError> {
    let broker = BrokerAddress::parse(&config.mqtt.uri)?;
    let stdout = std::io::stdout();
    write_summary(&mut stdout.lock(), manager.path(), config, &broker)?;
    Ok(())
}

/// Writes a human-readable summary. The modem password and the broker
/// password are never printed.
fn write_summary(
    out: &mut impl Write,
    path: &Path,
    config: &AppConfig,
    broker: &BrokerAddress,
) -> std::io::Result<()> {
    let mqtt = &config.mqtt;
    let modem = &config.xdsl;
    let topics = mqtt.topics();

    writeln!(out, "Configuration: {}", path.display())?;
    writeln!(out)?;
    writeln!(out, "MQTT broker:   {}:{}", broker.host, broker.port)?;
    if let Some(user) = &broker.username {
        writeln!(out, "  User:        {user}")?;
    }
    writeln!(out, "  Client ID:   {}", mqtt.client_id)?;
    writeln!(out, "  Topics:      {}, {}", topics.stats(), topics.interface())?;
    writeln!(out)?;
    writeln!(out, "Modem:         {}:{}", modem.host, modem.port)?;
    writeln!(out, "  User:        {}", modem.user)?;
    writeln!(out, "  Interface:   {}", modem.interface)?;
    writeln!(
        out,
        "  Timeouts:    connect {}s, command {}s",
        modem.connect_timeout, modem.command_timeout
    )?;
    writeln!(out, "  Poll delay:  {}s", modem.poll_delay)?;
    writeln!(out)?;

    match &config.restart {
        Some(restart) => {
            let at = restart.at.as_deref().unwrap_or_default();
            let min_up = restart.min_up.unwrap_or_default();
            let min_down = restart.min_down.unwrap_or_default();
            writeln!(
                out,
                "Restart check: daily at {at}, when max rate is below {min_up} Kbps up or {min_down} Kbps down"
            )?;
        }
        None => writeln!(out, "Restart check: disabled")?,
    }
    Ok(())
}
