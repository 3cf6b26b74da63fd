use std::collections::BTreeMap;

use serde_json::Value;

use kpilens_core::fragment::{DeviceMixFragment, Periods};

use crate::{envelope, extract};

pub(crate) const UNKNOWN: &str = "Unknown";

/// Per-key counts as fractions of their total.
pub(crate) fn shares(counts: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = counts.values().sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }
    counts
        .iter()
        .map(|(key, count)| (key.clone(), count / total))
        .collect()
}

fn device_counts(rows: &[&Value]) -> BTreeMap<String, f64> {
    let mut counts = BTreeMap::new();
    for row in rows {
        let count = extract::row_total(row);
        if count <= 0.0 {
            continue;
        }
        let device =
            extract::label_from_breakdown_or_label(row).unwrap_or_else(|| UNKNOWN.to_string());
        *counts.entry(device).or_insert(0.0) += count;
    }
    counts
}

fn fragment(rows: &[&Value]) -> DeviceMixFragment {
    DeviceMixFragment {
        device_mix: shares(&device_counts(rows)),
    }
}

/// Device-mix fragment from a breakdown-by-device trends payload.
///
/// Each period is normalised on its own, so current and previous fractions
/// each sum to one.
pub fn parse_device_mix(raw: &Value, has_comparison: bool) -> Periods<DeviceMixFragment> {
    let (current, previous) = extract::partition_by_period(envelope::rows(raw), has_comparison);
    if has_comparison {
        Periods::with_previous(fragment(&current), fragment(&previous))
    } else {
        Periods::current_only(fragment(&current))
    }
}
