//! Parse command: run the record parser over captured command output.

use std::io::Read;
use std::path::Path;

use xdsl2mqtt_core::{MetricRecord, parse_interface, parse_stats};

use crate::cli::RecordKind;
use crate::error::CliError;

/// Execute the parse command
pub fn cmd_parse(kind: RecordKind, file: Option<&Path>, pretty: bool) -> Result<(), CliError> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let record = parse_text(kind, &text);
    tracing::debug!(fields = record.len(), "Parsed captured output");
    println!("{}", render(&record, pretty)?);
    Ok(())
}

fn parse_text(kind: RecordKind, text: &str) -> MetricRecord {
    let text = text.replace("\r\n", "\n");
    match kind {
        RecordKind::Stats => parse_stats(&text),
        RecordKind::Interface => parse_interface(&text),
    }
}

pub(super) fn render(record: &MetricRecord, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(record)
    } else {
        serde_json::to_string(record)
    }
}
