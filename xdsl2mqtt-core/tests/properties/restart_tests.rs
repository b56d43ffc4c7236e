//! Property tests for the daily restart schedule

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use proptest::prelude::*;
use xdsl2mqtt_core::restart::next_occurrence;
use xdsl2mqtt_core::{DownUp, RestartDecision, RestartPolicy, parse_time_of_day};

fn instant_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (0u32..3650, 0u32..86_400).prop_map(|(days, secs)| {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + TimeDelta::days(i64::from(days));
        date.and_time(NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap())
    })
}

fn time_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

proptest! {
    /// Property: the next check is at the configured time, within one day
    #[test]
    fn next_occurrence_is_within_a_day(at in time_strategy(), now in instant_strategy()) {
        let next = next_occurrence(at, now);
        prop_assert_eq!(next.time(), at);
        prop_assert!(next >= now);
        prop_assert!(next - now < TimeDelta::days(1));
    }

    /// Property: every valid HH:MM value parses to the same time
    #[test]
    fn valid_times_parse(h in 0u32..24, m in 0u32..60) {
        let parsed = parse_time_of_day(&format!("{h:02}:{m:02}")).unwrap();
        prop_assert_eq!(parsed, NaiveTime::from_hms_opt(h, m, 0).unwrap());
    }

    /// Property: out-of-range hours or minutes are rejected
    #[test]
    fn out_of_range_times_fail(h in 24u32..1000, m in 60u32..1000) {
        let bad_hour = format!("{h}:00");
        let bad_minute = format!("00:{m}");
        prop_assert!(parse_time_of_day(&bad_hour).is_err());
        prop_assert!(parse_time_of_day(&bad_minute).is_err());
    }

    /// Property: restart is decided exactly when a direction is under its minimum
    #[test]
    fn restart_iff_below_threshold(
        min_up in 0i64..100_000,
        min_down in 0i64..200_000,
        up in 0i64..100_000,
        down in 0i64..200_000,
    ) {
        let at = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut policy = RestartPolicy::new(at, min_up, min_down, start);
        let max_rate = DownUp::new(down, up);

        let decision = policy.evaluate(start + TimeDelta::hours(5), Some(max_rate));
        if up < min_up || down < min_down {
            prop_assert_eq!(decision, RestartDecision::Restart { max_rate });
        } else {
            prop_assert_eq!(decision, RestartDecision::Healthy { max_rate });
        }
    }
}
