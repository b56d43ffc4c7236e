//! Property tests for label-anchored field extraction

use proptest::prelude::*;
use xdsl2mqtt_core::{
    DownUp, MetricValue, NumericKind, extract_downup_pair, extract_float_pair, extract_int,
    extract_int_pair, extract_rate_pair, extract_string,
};

/// Labels shaped like the modem's: words, parentheses, always ending in ':'
fn label_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z ()/.]{0,12}:"
}

/// Filler text that can never contain a label (no ':')
fn noise_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9 \t\n]{0,60}"
}

fn gap_strategy() -> impl Strategy<Value = String> {
    "[ \t]{1,4}"
}

proptest! {
    /// Property: an integer after its label is found wherever it sits
    #[test]
    fn int_after_label_is_extracted(
        label in label_strategy(),
        value in 0u32..,
        before in noise_strategy(),
        after in noise_strategy(),
        gap in "[ \t]{0,4}",
    ) {
        let text = format!("{before}\n{label}{gap}{value}\n{after}");
        prop_assert_eq!(extract_int(&text, &label), Some(i64::from(value)));
    }

    /// Property: text after a label is returned trimmed
    #[test]
    fn string_after_label_is_trimmed(
        label in label_strategy(),
        value in "[A-Za-z0-9][A-Za-z0-9 ]{0,20}[A-Za-z0-9]",
        gap in gap_strategy(),
    ) {
        let text = format!("{label}{gap}{value}  \nNext line");
        prop_assert_eq!(extract_string(&text, &label), Some(value));
    }

    /// Property: down/up integer tokens come back in down/up order
    #[test]
    fn int_pair_keeps_down_then_up(
        label in label_strategy(),
        down in any::<i64>(),
        up in any::<i64>(),
        gap1 in gap_strategy(),
        gap2 in gap_strategy(),
        before in noise_strategy(),
        after in noise_strategy(),
    ) {
        let text = format!("{before}\n{label}{gap1}{down}{gap2}{up}\n{after}");
        prop_assert_eq!(extract_int_pair(&text, &label), Some(DownUp::new(down, up)));
        prop_assert_eq!(
            extract_downup_pair(&text, &label, NumericKind::Integer),
            Some(MetricValue::IntPair(DownUp::new(down, up)))
        );
    }

    /// Property: finite floats survive formatting and extraction unchanged
    #[test]
    fn float_pair_is_exact(
        label in label_strategy(),
        down in -1.0e6f64..1.0e6,
        up in -1.0e6f64..1.0e6,
        gap in gap_strategy(),
        before in noise_strategy(),
        after in noise_strategy(),
    ) {
        let text = format!("{before}\n{label}{gap}{down}{gap}{up}\n{after}");
        prop_assert_eq!(extract_float_pair(&text, &label), Some(DownUp::new(down, up)));
    }

    /// Property: the rate line lists upstream first but is stored down/up
    #[test]
    fn rate_pair_swaps_into_down_up(
        label in label_strategy(),
        up in any::<u32>(),
        down in any::<u32>(),
    ) {
        let text = format!("{label}\tUpstream rate = {up} Kbps, Downstream rate = {down} Kbps\n");
        prop_assert_eq!(
            extract_rate_pair(&text, &label),
            Some(DownUp::new(i64::from(down), i64::from(up)))
        );
    }

    /// Property: no extractor reports a field whose label is absent
    #[test]
    fn absent_label_is_a_miss(label in label_strategy(), text in noise_strategy()) {
        prop_assert_eq!(extract_string(&text, &label), None);
        prop_assert_eq!(extract_int(&text, &label), None);
        prop_assert_eq!(extract_rate_pair(&text, &label), None);
        prop_assert_eq!(extract_int_pair(&text, &label), None);
        prop_assert_eq!(extract_float_pair(&text, &label), None);
    }

    /// Property: a non-numeric token turns the whole pair into a miss
    #[test]
    fn non_numeric_token_is_a_miss(
        label in label_strategy(),
        down in any::<i32>(),
        junk in "[a-z]{1,6}",
    ) {
        let text = format!("{label}\t{down}\t{junk}");
        prop_assert_eq!(extract_int_pair(&text, &label), None);
        prop_assert_eq!(extract_downup_pair(&text, &label, NumericKind::Float), None);
    }
}
