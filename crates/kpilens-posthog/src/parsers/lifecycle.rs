use serde_json::Value;

use kpilens_core::fragment::{LifecycleFragment, LifecycleSeries};

use crate::{envelope, extract};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    New,
    Returning,
    Resurrecting,
    Dormant,
}

fn bucket_of(row: &Value) -> Option<Bucket> {
    let label = row
        .get("label")
        .or_else(|| row.get("status"))
        .and_then(Value::as_str)?
        .to_ascii_lowercase();
    [
        ("new", Bucket::New),
        ("returning", Bucket::Returning),
        ("resurrecting", Bucket::Resurrecting),
        ("dormant", Bucket::Dormant),
    ]
    .into_iter()
    .find(|(needle, _)| label.contains(needle))
    .map(|(_, bucket)| bucket)
}

fn data(row: &Value) -> Vec<f64> {
    row.get("data")
        .and_then(Value::as_array)
        .map(|points| points.iter().map(|v| extract::number(v).unwrap_or(0.0)).collect())
        .unwrap_or_default()
}

/// Element-wise add `points` into `into`, growing it as needed.
fn accumulate(into: &mut Vec<f64>, points: &[f64]) {
    if into.len() < points.len() {
        into.resize(points.len(), 0.0);
    }
    for (slot, point) in into.iter_mut().zip(points) {
        *slot += point;
    }
}

/// Lifecycle fragment from a lifecycle payload.
///
/// Rows whose label names none of the four states are dropped. Day labels
/// are generated from the first row's series length.
pub fn parse_lifecycle(raw: &Value) -> LifecycleFragment {
    let rows = envelope::rows(raw);
    let days = rows.first().map(|row| data(row).len()).unwrap_or(0);

    let mut series = LifecycleSeries::default();
    for row in rows {
        let Some(bucket) = bucket_of(row) else {
            continue;
        };
        let target = match bucket {
            Bucket::New => &mut series.new,
            Bucket::Returning => &mut series.returning,
            Bucket::Resurrecting => &mut series.resurrecting,
            Bucket::Dormant => &mut series.dormant,
        };
        accumulate(target, &data(row));
    }

    LifecycleFragment {
        labels: (1..=days).map(|day| format!("Day {day}")).collect(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_bucket_by_label_substring() {
        let raw = json!({ "results": [
            { "label": "$pageview - New", "data": [1, 2, 3], "labels": ["a", "b", "c"] },
            { "label": "$pageview - RETURNING", "data": [4, 5, 6] },
            { "label": "$pageview - resurrecting", "data": [0, 1, 0] },
            { "label": "$pageview - dormant", "data": [-1, -2, -3] },
            { "label": "$pageview - something else", "data": [9, 9, 9] },
        ]});
        let parsed = parse_lifecycle(&raw);
        assert_eq!(parsed.labels, vec!["Day 1", "Day 2", "Day 3"]);
        assert_eq!(parsed.series.new, vec![1.0, 2.0, 3.0]);
        assert_eq!(parsed.series.returning, vec![4.0, 5.0, 6.0]);
        assert_eq!(parsed.series.resurrecting, vec![0.0, 1.0, 0.0]);
        assert_eq!(parsed.series.dormant, vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn status_field_is_accepted() {
        let raw = json!([{ "status": "new", "data": [7] }]);
        assert_eq!(parse_lifecycle(&raw).series.new, vec![7.0]);
    }

    #[test]
    fn empty_payloads() {
        for raw in [json!([]), json!({ "results": [] }), json!({ "result": [] })] {
            assert_eq!(parse_lifecycle(&raw), LifecycleFragment::default());
        }
    }
}
