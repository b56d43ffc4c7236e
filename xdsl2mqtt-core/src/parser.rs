//! Record parser for modem command output
//!
//! Turns the raw output of `xdslctl info --stats` and `ifconfig <ifname>`
//! into [`MetricRecord`]s by running a fixed, static extraction schema over
//! the text. Every field is optional; a record with nothing matched is valid
//! output.

use crate::extract::{self, NumericKind};
use crate::record::{MetricRecord, MetricValue};

/// How a field's value is read from the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Rest of the line, trimmed
    Text,
    /// Unsigned decimal run
    Integer,
    /// `Upstream rate = N Kbps, Downstream rate = N Kbps`
    RatePair,
    /// Two whitespace-separated tokens, down then up
    DownUp(NumericKind),
}

/// One extraction rule: where to find a field and where to store it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Key in the resulting record
    pub key: &'static str,
    /// Label that precedes the value in the text
    pub prefix: &'static str,
    /// Value conversion
    pub kind: FieldKind,
    /// Nested group the value is stored in, if any
    pub group: Option<&'static str>,
}

impl FieldRule {
    const fn top(key: &'static str, prefix: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            prefix,
            kind,
            group: None,
        }
    }

    const fn grouped(
        group: &'static str,
        key: &'static str,
        prefix: &'static str,
        kind: FieldKind,
    ) -> Self {
        Self {
            key,
            prefix,
            kind,
            group: Some(group),
        }
    }

    /// Applies this rule to `raw`, returning the extracted value if found
    #[must_use]
    pub fn extract(&self, raw: &str) -> Option<MetricValue> {
        match self.kind {
            FieldKind::Text => extract::extract_string(raw, self.prefix).map(MetricValue::Text),
            FieldKind::Integer => extract::extract_int(raw, self.prefix).map(MetricValue::Integer),
            FieldKind::RatePair => {
                extract::extract_rate_pair(raw, self.prefix).map(MetricValue::IntPair)
            }
            FieldKind::DownUp(kind) => extract::extract_downup_pair(raw, self.prefix, kind),
        }
    }
}

/// Group key for line error counters
pub const ERROR_COUNTERS_GROUP: &str = "error_counters";
/// Group key for G.INP counters
pub const GINP_GROUP: &str = "ginp";
/// Group key for interface packet counts
pub const PACKETS_GROUP: &str = "packets";
/// Group key for interface byte counts
pub const BYTES_GROUP: &str = "bytes";

/// Key of the live-link flag in the interface record
pub const LINK_UP_KEY: &str = "up";
/// Key of the max attainable rate in the statistics record
pub const MAX_RATE_KEY: &str = "max_rate";

const INT_PAIR: FieldKind = FieldKind::DownUp(NumericKind::Integer);
const FLOAT_PAIR: FieldKind = FieldKind::DownUp(NumericKind::Float);

/// Extraction schema for `xdslctl info --stats`
///
/// Retrain reason and init status look like enumerations but their meaning
/// is vendor specific, so they stay opaque text.
pub const STATS_SCHEMA: &[FieldRule] = &[
    FieldRule::top("profile", "Profile:", FieldKind::Text),
    FieldRule::top("line_status", "Line Status:", FieldKind::Text),
    FieldRule::top("training_status", "Training Status:", FieldKind::Text),
    FieldRule::top("last_retrain_reason", "Last Retrain Reason:", FieldKind::Text),
    FieldRule::top(
        "last_init_status",
        "Last initialization procedure status:",
        FieldKind::Text,
    ),
    FieldRule::top("snr_db", "SNR (dB):", FLOAT_PAIR),
    FieldRule::top("atten_db", "Attn(dB):", FLOAT_PAIR),
    FieldRule::top("power_dbm", "Pwr(dBm):", FLOAT_PAIR),
    // Current rate, reported for bearer 0
    FieldRule::top("rate", "Bearer: 0,", FieldKind::RatePair),
    FieldRule::top(MAX_RATE_KEY, "Max:", FieldKind::RatePair),
    // https://kitz.co.uk/adsl/linestats_errors.htm
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "FEC", "FEC:", INT_PAIR),
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "CRC", "CRC:", INT_PAIR),
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "ES", "ES:", INT_PAIR),
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "SES", "SES:", INT_PAIR),
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "UAS", "UAS:", INT_PAIR),
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "LOS", "LOS:", INT_PAIR),
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "LOF", "LOF:", INT_PAIR),
    FieldRule::grouped(ERROR_COUNTERS_GROUP, "LOM", "LOM:", INT_PAIR),
    // Seconds with a Low Error-Free Throughput defect
    FieldRule::grouped(GINP_GROUP, "LEFTRS", "LEFTRS:", INT_PAIR),
    // Minimum Error-Free Throughput
    FieldRule::grouped(GINP_GROUP, "min_EFTR", "minEFTR:", INT_PAIR),
];

/// Extraction schema for `ifconfig <ifname>`
///
/// The link flag is not label based and is handled by [`parse_interface`].
pub const INTERFACE_SCHEMA: &[FieldRule] = &[
    FieldRule::grouped(PACKETS_GROUP, "rx", "RX packets:", FieldKind::Integer),
    FieldRule::grouped(PACKETS_GROUP, "tx", "TX packets:", FieldKind::Integer),
    FieldRule::grouped(BYTES_GROUP, "rx", "RX bytes:", FieldKind::Integer),
    FieldRule::grouped(BYTES_GROUP, "tx", "TX bytes:", FieldKind::Integer),
];

/// Stateless schema runner
pub struct MetricsParser;

impl MetricsParser {
    /// Runs `schema` over `raw`, appending matches to `record`.
    ///
    /// Groups named by the schema are created even when none of their fields
    /// match.
    pub fn apply(record: &mut MetricRecord, raw: &str, schema: &[FieldRule]) {
        for rule in schema {
            let dest = match rule.group {
                Some(group) => record.group_mut(group),
                None => &mut *record,
            };
            if let Some(value) = rule.extract(raw) {
                dest.insert(rule.key, value);
            } else {
                tracing::trace!(key = rule.key, prefix = rule.prefix, "Field not found");
            }
        }
    }

    /// Runs `schema` over `raw` into a fresh record
    #[must_use]
    pub fn parse(raw: &str, schema: &[FieldRule]) -> MetricRecord {
        let mut record = MetricRecord::new();
        Self::apply(&mut record, raw, schema);
        record
    }
}

/// Parses the output of `xdslctl info --stats`
#[must_use]
pub fn parse_stats(raw: &str) -> MetricRecord {
    MetricsParser::parse(raw, STATS_SCHEMA)
}

/// Parses the output of `ifconfig <ifname>`
#[must_use]
pub fn parse_interface(raw: &str) -> MetricRecord {
    let mut record = MetricRecord::new();
    record.insert(LINK_UP_KEY, MetricValue::Flag(raw.contains(" UP ")));
    MetricsParser::apply(&mut record, raw, INTERFACE_SCHEMA);
    record
}
