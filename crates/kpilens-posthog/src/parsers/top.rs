use serde_json::Value;

use kpilens_core::fragment::{Periods, TopEntriesFragment, TopEntry};

use crate::{envelope, extract};

pub const TOP_LIMIT: usize = 10;
pub const DIRECT_LABEL: &str = "Direct / Unknown";

fn rank(rows: &[&Value], empty_label: Option<&str>) -> TopEntriesFragment {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for row in rows {
        let Some(value) = extract::label_from_breakdown_or_label(row)
            .or_else(|| empty_label.map(str::to_string))
        else {
            continue;
        };
        let count = extract::row_total(row);
        match totals.iter_mut().find(|(existing, _)| *existing == value) {
            Some((_, total)) => *total += count,
            None => totals.push((value, count)),
        }
    }

    let total: f64 = totals.iter().map(|(_, count)| count).sum();
    // Stable sort: equal values keep their upstream order.
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    let entries = totals
        .into_iter()
        .take(TOP_LIMIT)
        .map(|(value, count)| TopEntry {
            share: if total > 0.0 { count / total } else { 0.0 },
            value,
            count,
        })
        .collect();

    TopEntriesFragment { entries, total }
}

fn split(
    raw: &Value,
    has_comparison: bool,
    empty_label: Option<&str>,
) -> Periods<TopEntriesFragment> {
    let (current, previous) = extract::partition_by_period(envelope::rows(raw), has_comparison);
    if has_comparison {
        Periods::with_previous(rank(&current, empty_label), rank(&previous, empty_label))
    } else {
        Periods::current_only(rank(&current, empty_label))
    }
}

/// Top ten pages by count, each with its share of the period total. Rows
/// without a path are skipped.
pub fn parse_top_pages(raw: &Value, has_comparison: bool) -> Periods<TopEntriesFragment> {
    split(raw, has_comparison, None)
}

/// Top ten referring domains. Rows with an empty or null domain are grouped
/// as direct traffic.
pub fn parse_referring_domains(raw: &Value, has_comparison: bool) -> Periods<TopEntriesFragment> {
    split(raw, has_comparison, Some(DIRECT_LABEL))
}
