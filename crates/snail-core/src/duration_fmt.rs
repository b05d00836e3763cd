//! Human-readable elapsed-time labels ("45s", "2 minute(s) ago").

use chrono::{DateTime, Utc};
use strum::IntoStaticStr;

/// Unit an elapsed-seconds count is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum DurationUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// `(inclusive lower bound, unit)`, evaluated top to bottom.
const BOUNDARIES: [(u64, DurationUnit); 6] = [
    (7_889_231, DurationUnit::Month),
    (604_800, DurationUnit::Week),
    (86_400, DurationUnit::Day),
    (3_600, DurationUnit::Hour),
    (60, DurationUnit::Minute),
    (0, DurationUnit::Second),
];

impl DurationUnit {
    /// Pick the unit for an elapsed-seconds count.
    pub fn for_elapsed(secs: u64) -> Self {
        BOUNDARIES
            .iter()
            .find(|(lower, _)| secs >= *lower)
            .map_or(Self::Second, |(_, unit)| *unit)
    }

    /// Seconds per unit. A month is 2,628,000 s (30.4 days).
    pub fn seconds(self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Week => 604_800,
            Self::Month => 2_628_000,
        }
    }

    pub fn short_suffix(self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "w",
            Self::Month => "M",
        }
    }
}

/// Format elapsed seconds as `45s` (short) or `45 second(s)`.
pub fn format(elapsed_secs: u64, short: bool) -> String {
    let unit = DurationUnit::for_elapsed(elapsed_secs);
    let count = elapsed_secs / unit.seconds();
    if short {
        format!("{count}{}", unit.short_suffix())
    } else {
        let word: &'static str = unit.into();
        format!("{count} {word}(s)")
    }
}

/// [`format`] with an optional trailing " ago".
pub fn format_with_suffix(elapsed_secs: u64, short: bool, ago: bool) -> String {
    let mut label = format(elapsed_secs, short);
    if ago {
        label.push_str(" ago");
    }
    label
}

/// Label for the time since an epoch-seconds timestamp.
///
/// A missing or zero timestamp reads "never"; timestamps in the future
/// count as zero elapsed.
pub fn duration_since(timestamp: Option<i64>, now: DateTime<Utc>, short: bool, ago: bool) -> String {
    let Some(ts) = timestamp.filter(|ts| *ts != 0) else {
        return "never".into();
    };
    let elapsed = u64::try_from(now.timestamp().saturating_sub(ts)).unwrap_or(0);
    format_with_suffix(elapsed, short, ago)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn short_labels() {
        assert_eq!(format(45, true), "45s");
        assert_eq!(format(125, true), "2m");
        assert_eq!(format(7_200, true), "2h");
        assert_eq!(format(0, true), "0s");
    }

    #[test]
    fn long_labels_mark_plural() {
        assert_eq!(format(90_000, false), "1 day(s)");
        assert_eq!(format(1, false), "1 second(s)");
        assert_eq!(format(1_209_600, false), "2 week(s)");
    }

    #[test]
    fn boundaries_are_inclusive_below() {
        assert_eq!(DurationUnit::for_elapsed(59), DurationUnit::Second);
        assert_eq!(DurationUnit::for_elapsed(60), DurationUnit::Minute);
        assert_eq!(DurationUnit::for_elapsed(3_599), DurationUnit::Minute);
        assert_eq!(DurationUnit::for_elapsed(3_600), DurationUnit::Hour);
        assert_eq!(DurationUnit::for_elapsed(86_399), DurationUnit::Hour);
        assert_eq!(DurationUnit::for_elapsed(86_400), DurationUnit::Day);
        assert_eq!(DurationUnit::for_elapsed(604_799), DurationUnit::Day);
        assert_eq!(DurationUnit::for_elapsed(604_800), DurationUnit::Week);
        assert_eq!(DurationUnit::for_elapsed(7_889_230), DurationUnit::Week);
        assert_eq!(DurationUnit::for_elapsed(7_889_231), DurationUnit::Month);
    }

    #[test]
    fn months_divide_by_average_month() {
        // 7,889,231 / 2,628,000 = 3.002...
        assert_eq!(format(7_889_231, true), "3M");
        assert_eq!(format(7_889_231, false), "3 month(s)");
        // Last second of the week range still reads in weeks.
        assert_eq!(format(7_889_230, true), "13w");
    }

    #[test]
    fn ago_suffix() {
        assert_eq!(format_with_suffix(45, true, true), "45s ago");
        assert_eq!(format_with_suffix(45, true, false), "45s");
    }

    #[test]
    fn duration_since_timestamp() {
        let now = Utc.timestamp_opt(1_700_000_125, 0).unwrap();
        assert_eq!(duration_since(Some(1_700_000_000), now, true, true), "2m ago");
        assert_eq!(duration_since(None, now, true, true), "never");
        assert_eq!(duration_since(Some(0), now, false, false), "never");
        assert_eq!(duration_since(Some(1_800_000_000), now, true, false), "0s");
    }
}
