//! Normalized per-family KPI fragments.
//!
//! Every fragment's `Default` is its documented empty value, so a family that
//! failed upstream still renders as a complete, well-typed object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current-period fragment plus, when comparison produced one, the
/// previous-period fragment of the same family.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Periods<T> {
    pub current: T,
    pub previous: Option<T>,
}

impl<T> Periods<T> {
    pub fn current_only(current: T) -> Self {
        Self {
            current,
            previous: None,
        }
    }

    pub fn with_previous(current: T, previous: T) -> Self {
        Self {
            current,
            previous: Some(previous),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrafficFragment {
    pub series: Vec<f64>,
    pub labels: Vec<String>,
    pub unique_users: f64,
    pub pageviews: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStep {
    pub name: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDrop {
    pub from: String,
    pub to: String,
    #[serde(rename = "dropRate")]
    pub drop_rate: f64,
}

impl Default for TopDrop {
    fn default() -> Self {
        Self {
            from: "N/A".to_string(),
            to: "N/A".to_string(),
            drop_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunnelFragment {
    pub steps: Vec<FunnelStep>,
    /// `last / first`, in `0..=1` for monotone funnels.
    pub conversion_rate: f64,
    pub median_time_to_convert_sec: f64,
    pub top_drop: TopDrop,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LifecycleSeries {
    pub new: Vec<f64>,
    pub returning: Vec<f64>,
    pub resurrecting: Vec<f64>,
    pub dormant: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LifecycleFragment {
    pub labels: Vec<String>,
    pub series: LifecycleSeries,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceMixFragment {
    /// Device label → fraction of the period's total (`0..=1`).
    pub device_mix: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionValue {
    pub day: usize,
    pub count: f64,
    /// Share of the day-0 population, `0..=100`.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetentionFragment {
    pub d7_retention: f64,
    pub values: Vec<RetentionValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeographyFragment {
    /// Upper-cased ISO country code → count.
    pub countries: BTreeMap<String, f64>,
    /// Same keys as `countries`, as fractions of the period total.
    pub country_shares: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityEntry {
    pub city: String,
    pub country: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CityGeographyFragment {
    /// Keyed by `"{city}, {country}"`.
    pub cities: BTreeMap<String, CityEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEntry {
    pub value: String,
    pub count: f64,
    pub share: f64,
}

/// Top pages or referring domains for one period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopEntriesFragment {
    pub entries: Vec<TopEntry>,
    /// Total across every row of the period, including truncated ones.
    pub total: f64,
}

/// A single number: session count, mean session duration, or bounce rate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScalarFragment {
    pub value: f64,
}
