//! Symbolic date-range tokens and the relative filters sent upstream.

use serde::{Deserialize, Serialize};

/// Relative date window understood by the upstream query API.
///
/// Offsets are relative to "now" (`-7d`, `-24h`). A `date_to` of `None`
/// means the window runs up to the present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub date_from: String,
    pub date_to: Option<String>,
}

impl DateFilter {
    fn relative(from: &str, to: Option<&str>) -> Self {
        Self {
            date_from: from.to_string(),
            date_to: to.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateRangeToken {
    LastHour,
    LastDay,
    #[default]
    LastWeek,
    LastTwoWeeks,
    LastMonth,
    LastQuarter,
}

impl DateRangeToken {
    pub const ALL: [DateRangeToken; 6] = [
        DateRangeToken::LastHour,
        DateRangeToken::LastDay,
        DateRangeToken::LastWeek,
        DateRangeToken::LastTwoWeeks,
        DateRangeToken::LastMonth,
        DateRangeToken::LastQuarter,
    ];

    /// Parse a token such as `"30d"`. Unknown tokens fall back to `7d`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "1h" => Self::LastHour,
            "24h" => Self::LastDay,
            "7d" => Self::LastWeek,
            "14d" => Self::LastTwoWeeks,
            "30d" => Self::LastMonth,
            "90d" => Self::LastQuarter,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::LastDay => "24h",
            Self::LastWeek => "7d",
            Self::LastTwoWeeks => "14d",
            Self::LastMonth => "30d",
            Self::LastQuarter => "90d",
        }
    }

    /// Number of days after the cohort start a retention reading targets.
    pub fn retention_days(&self) -> usize {
        match self {
            Self::LastHour | Self::LastDay => 1,
            Self::LastWeek => 7,
            Self::LastTwoWeeks => 14,
            Self::LastMonth => 30,
            Self::LastQuarter => 90,
        }
    }

    pub fn filter(&self) -> DateFilter {
        match self {
            Self::LastHour => DateFilter::relative("-1h", None),
            Self::LastDay => DateFilter::relative("-24h", None),
            Self::LastWeek => DateFilter::relative("-7d", None),
            Self::LastTwoWeeks => DateFilter::relative("-14d", None),
            Self::LastMonth => DateFilter::relative("-30d", None),
            Self::LastQuarter => DateFilter::relative("-90d", None),
        }
    }

    /// The equal-length window that ends where [`Self::filter`] begins.
    pub fn comparison_filter(&self) -> DateFilter {
        match self {
            Self::LastHour => DateFilter::relative("-2h", Some("-1h")),
            Self::LastDay => DateFilter::relative("-48h", Some("-24h")),
            Self::LastWeek => DateFilter::relative("-14d", Some("-7d")),
            Self::LastTwoWeeks => DateFilter::relative("-28d", Some("-14d")),
            Self::LastMonth => DateFilter::relative("-60d", Some("-30d")),
            Self::LastQuarter => DateFilter::relative("-180d", Some("-90d")),
        }
    }
}

pub fn resolve(token: &str) -> DateFilter {
    DateRangeToken::parse(token).filter()
}

pub fn resolve_comparison(token: &str) -> DateFilter {
    DateRangeToken::parse(token).comparison_filter()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Length of a relative offset such as `-7d` in hours.
    fn offset_hours(offset: &str) -> i64 {
        let digits = offset.trim_start_matches('-');
        let (value, unit) = digits.split_at(digits.len() - 1);
        let value: i64 = value.parse().expect("numeric offset");
        match unit {
            "h" => value,
            "d" => value * 24,
            other => panic!("unexpected unit {other}"),
        }
    }

    #[test]
    fn unknown_token_falls_back_to_seven_days() {
        assert_eq!(resolve("banana"), resolve("7d"));
        assert_eq!(resolve(""), resolve("7d"));
        assert_eq!(resolve_comparison("banana"), resolve_comparison("7d"));
    }

    #[test]
    fn known_tokens_round_trip() {
        for token in DateRangeToken::ALL {
            assert_eq!(DateRangeToken::parse(token.as_str()), token);
        }
    }

    #[test]
    fn comparison_windows_precede_and_match_length() {
        for token in DateRangeToken::ALL {
            let current = token.filter();
            let previous = token.comparison_filter();

            assert!(current.date_to.is_none());
            let previous_to = previous.date_to.as_deref().expect("bounded window");
            assert_eq!(previous_to, current.date_from, "{token:?} windows must touch");

            let current_len = offset_hours(&current.date_from);
            let previous_len = offset_hours(&previous.date_from) - offset_hours(previous_to);
            assert_eq!(current_len, previous_len, "{token:?} windows differ in length");
        }
    }

    #[test]
    fn thirty_day_comparison() {
        assert_eq!(
            resolve_comparison("30d"),
            DateFilter {
                date_from: "-60d".to_string(),
                date_to: Some("-30d".to_string()),
            }
        );
    }
}
