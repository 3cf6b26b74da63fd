//! Named strategies for pulling counts and labels out of loosely-shaped rows.
//!
//! Rows carry any mix of `count`, `aggregated_value`, `data`,
//! `breakdown_value` and `label`. The precedence between them lives here so
//! every parser applies it the same way.

use serde_json::Value;

/// Null marker the upstream uses for rows whose breakdown property was unset.
pub const BREAKDOWN_NULL: &str = "$$_posthog_breakdown_null_$$";

/// Which comparison period a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Current,
    Previous,
}

/// A finite number, from a JSON number or a numeric string.
pub fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Explicit scalar total: `count`, then `aggregated_value`.
pub fn count_from_scalar(row: &Value) -> Option<f64> {
    ["count", "aggregated_value"]
        .iter()
        .find_map(|key| row.get(*key).and_then(number))
}

/// Sum of the row's `data` series.
pub fn count_from_series_sum(row: &Value) -> Option<f64> {
    let data = row.get("data")?.as_array()?;
    Some(data.iter().filter_map(number).sum())
}

/// Mean of the row's `data` series; `None` for an empty series.
pub fn count_from_series_mean(row: &Value) -> Option<f64> {
    let data = row.get("data")?.as_array()?;
    let points: Vec<f64> = data.iter().filter_map(number).collect();
    if points.is_empty() {
        return None;
    }
    Some(points.iter().sum::<f64>() / points.len() as f64)
}

/// Scalar total if present, else the series sum, else zero.
pub fn row_total(row: &Value) -> f64 {
    count_from_scalar(row)
        .or_else(|| count_from_series_sum(row))
        .unwrap_or(0.0)
}

/// Scalar if present (averaging math already applied upstream), else the
/// series mean, else zero.
pub fn row_average(row: &Value) -> f64 {
    count_from_scalar(row)
        .or_else(|| count_from_series_mean(row))
        .unwrap_or(0.0)
}

fn text(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if raw.is_empty() || raw == BREAKDOWN_NULL {
        None
    } else {
        Some(raw)
    }
}

/// `breakdown_value` (first element when it is an array), then `label`.
pub fn label_from_breakdown_or_label(row: &Value) -> Option<String> {
    let breakdown = row.get("breakdown_value").and_then(|value| match value {
        Value::Array(items) => items.first().and_then(text),
        other => text(other),
    });
    breakdown.or_else(|| row.get("label").and_then(text))
}

/// The `breakdown_value` array, each element normalised to text.
pub fn breakdown_parts(row: &Value) -> Vec<Option<String>> {
    match row.get("breakdown_value") {
        Some(Value::Array(items)) => items.iter().map(text).collect(),
        Some(other) => vec![text(other)],
        None => Vec::new(),
    }
}

/// The row's explicit `compare_label`, if it names a known period.
pub fn compare_period(row: &Value) -> Option<Period> {
    match row.get("compare_label").and_then(Value::as_str)?.trim() {
        label if label.eq_ignore_ascii_case("current") => Some(Period::Current),
        label if label.eq_ignore_ascii_case("previous") => Some(Period::Previous),
        _ => None,
    }
}

/// Split rows into `(current, previous)`.
///
/// Without comparison every row is current. With comparison, rows lacking a
/// recognised `compare_label` count as current.
pub fn partition_by_period(rows: &[Value], has_comparison: bool) -> (Vec<&Value>, Vec<&Value>) {
    if !has_comparison {
        return (rows.iter().collect(), Vec::new());
    }
    rows.iter()
        .partition(|row| compare_period(row) != Some(Period::Previous))
}
