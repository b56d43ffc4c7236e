//! Daily modem restart policy
//!
//! Once a day, at a configured local time, the max attainable rate reported
//! by the modem is compared against two thresholds. If either direction is
//! below its minimum the modem should be rebooted.

use std::sync::LazyLock;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;

use crate::error::{ConfigError, ConfigResult};
use crate::record::DownUp;

/// Cached regex for `HH:MM` values
static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d+)$").expect("TIME_OF_DAY is a valid regex pattern")
});

/// Parses a 24-hour `HH:MM` time of day
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTime`] unless the value is two numbers
/// separated by `:` with the hour in 0-23 and the minute in 0-59.
pub fn parse_time_of_day(value: &str) -> ConfigResult<NaiveTime> {
    let invalid = || ConfigError::InvalidTime(value.to_string());
    let caps = TIME_OF_DAY.captures(value).ok_or_else(invalid)?;
    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[2].parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// First instant at or after `now` whose time of day is `at`
#[must_use]
pub fn next_occurrence(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today < now {
        today + TimeDelta::days(1)
    } else {
        today
    }
}

/// Outcome of [`RestartPolicy::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// The next check time has not passed yet
    NotDue,
    /// Checked; both directions meet their minimum
    Healthy {
        /// Max attainable rate that was checked (Kbps)
        max_rate: DownUp<i64>,
    },
    /// Checked; at least one direction is below its minimum
    Restart {
        /// Max attainable rate that was checked (Kbps)
        max_rate: DownUp<i64>,
    },
}

/// Schedule and thresholds for the daily restart check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    at: NaiveTime,
    min_up: i64,
    min_down: i64,
    next_check: NaiveDateTime,
}

impl RestartPolicy {
    /// Creates a policy whose first check is the next occurrence of `at`
    #[must_use]
    pub fn new(at: NaiveTime, min_up: i64, min_down: i64, now: NaiveDateTime) -> Self {
        let next_check = next_occurrence(at, now);
        tracing::info!(
            at = %at.format("%H:%M"),
            min_up,
            min_down,
            "Daily restart check enabled"
        );
        tracing::debug!(%next_check, "Next restart check");
        Self {
            at,
            min_up,
            min_down,
            next_check,
        }
    }

    /// Time of day of the check
    #[must_use]
    pub const fn at(&self) -> NaiveTime {
        self.at
    }

    /// Minimum upstream max rate (Kbps)
    #[must_use]
    pub const fn min_up(&self) -> i64 {
        self.min_up
    }

    /// Minimum downstream max rate (Kbps)
    #[must_use]
    pub const fn min_down(&self) -> i64 {
        self.min_down
    }

    /// When the next check happens
    #[must_use]
    pub const fn next_check(&self) -> NaiveDateTime {
        self.next_check
    }

    /// Checks the thresholds if the scheduled time has passed.
    ///
    /// The schedule advances before the thresholds are compared, so a check
    /// runs at most once per occurrence whatever the outcome. A missing max
    /// rate (link down) counts as 0 in both directions.
    pub fn evaluate(&mut self, now: NaiveDateTime, max_rate: Option<DownUp<i64>>) -> RestartDecision {
        if now <= self.next_check {
            return RestartDecision::NotDue;
        }
        self.next_check = next_occurrence(self.at, now);
        tracing::debug!(next_check = %self.next_check, "Next restart check");

        let max_rate = max_rate.unwrap_or_else(|| {
            tracing::warn!("Checking restart conditions while interface appears down");
            DownUp::new(0, 0)
        });
        tracing::info!(
            up = max_rate.up,
            min_up = self.min_up,
            down = max_rate.down,
            min_down = self.min_down,
            "Checking restart conditions"
        );

        if max_rate.up < self.min_up || max_rate.down < self.min_down {
            RestartDecision::Restart { max_rate }
        } else {
            RestartDecision::Healthy { max_rate }
        }
    }
}
