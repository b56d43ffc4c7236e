//! Field extraction from free-form command output
//!
//! Each function searches a block of text for a label prefix and converts
//! the value that follows it. A label that is absent, or whose value cannot
//! be converted, yields `None`; nothing here returns an error.
//!
//! Only the first match in the block is considered. `xdslctl info --stats`
//! prints its counters once per time window and the "Totals" window comes
//! first, so the first match is the one we want.

use regex::Regex;

use crate::record::{DownUp, MetricValue};

/// Numeric type a down/up token pair is converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// Signed integer
    Integer,
    /// Finite floating-point number
    Float,
}

/// Compiles `<escaped prefix><suffix>`.
///
/// The prefix is escaped, so compilation only fails if `suffix` itself is
/// malformed; that is treated as a miss like everything else here.
fn labeled(prefix: &str, suffix: &str) -> Option<Regex> {
    Regex::new(&format!("{}{suffix}", regex::escape(prefix))).ok()
}

/// Extracts the rest of the line following `prefix`, trimmed.
///
/// Format: `<prefix>   VALUE`
#[must_use]
pub fn extract_string(text: &str, prefix: &str) -> Option<String> {
    let re = labeled(prefix, r"\s*(.+)")?;
    let caps = re.captures(text)?;
    Some(caps[1].trim().to_string())
}

/// Extracts the unsigned decimal run following `prefix`.
///
/// Format: `<prefix>   12345`
#[must_use]
pub fn extract_int(text: &str, prefix: &str) -> Option<i64> {
    let re = labeled(prefix, r"\s*(\d+)")?;
    let caps = re.captures(text)?;
    caps[1].parse().ok()
}

/// Extracts a rate pair in the one-off `xdslctl` format.
///
/// Format: `<prefix> Upstream rate = UP Kbps, Downstream rate = DOWN Kbps`
///
/// The text lists upstream first; the result keeps the usual down/up naming.
#[must_use]
pub fn extract_rate_pair(text: &str, prefix: &str) -> Option<DownUp<i64>> {
    let re = labeled(
        prefix,
        r"\s*Upstream rate = (\d+) Kbps, Downstream rate = (\d+) Kbps",
    )?;
    let caps = re.captures(text)?;
    let up = caps[1].parse().ok()?;
    let down = caps[2].parse().ok()?;
    Some(DownUp { down, up })
}

/// Finds the two whitespace-separated tokens following `prefix`.
///
/// Format: `<prefix>   DOWN   UP`
fn downup_tokens<'t>(text: &'t str, prefix: &str) -> Option<(&'t str, &'t str)> {
    let re = labeled(prefix, r"\s+(\S+)\s+(\S+)")?;
    let caps = re.captures(text)?;
    let down = caps.get(1)?.as_str();
    let up = caps.get(2)?.as_str();
    Some((down, up))
}

/// Extracts a down/up pair of integers following `prefix`.
#[must_use]
pub fn extract_int_pair(text: &str, prefix: &str) -> Option<DownUp<i64>> {
    let (down, up) = downup_tokens(text, prefix)?;
    Some(DownUp {
        down: down.parse().ok()?,
        up: up.parse().ok()?,
    })
}

/// Extracts a down/up pair of finite floats following `prefix`.
///
/// `nan` and `inf` tokens count as conversion failures, since they have no
/// JSON representation.
#[must_use]
pub fn extract_float_pair(text: &str, prefix: &str) -> Option<DownUp<f64>> {
    let (down, up) = downup_tokens(text, prefix)?;
    let parse = |token: &str| token.parse::<f64>().ok().filter(|v| v.is_finite());
    Some(DownUp {
        down: parse(down)?,
        up: parse(up)?,
    })
}

/// Extracts a down/up pair converted to `kind`, wrapped as a [`MetricValue`].
///
/// A token that does not convert makes the whole field a miss.
#[must_use]
pub fn extract_downup_pair(text: &str, prefix: &str, kind: NumericKind) -> Option<MetricValue> {
    match kind {
        NumericKind::Integer => extract_int_pair(text, prefix).map(MetricValue::IntPair),
        NumericKind::Float => extract_float_pair(text, prefix).map(MetricValue::FloatPair),
    }
}
