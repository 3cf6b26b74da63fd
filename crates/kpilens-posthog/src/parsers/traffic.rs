use serde_json::Value;
use tracing::debug;

use kpilens_core::fragment::{Periods, TrafficFragment};

use crate::{
    envelope,
    extract::{self, Period},
};

/// `math` values that count distinct people rather than events.
const VISITOR_MATHS: [&str; 4] = ["dau", "unique_users", "weekly_active", "monthly_active"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesKind {
    Visitors,
    Pageviews,
}

fn series_name(row: &Value) -> String {
    [
        row.get("custom_name"),
        row.get("action").and_then(|a| a.get("custom_name")),
        row.get("label"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .collect::<Vec<_>>()
    .join(" ")
    .to_ascii_lowercase()
}

/// Guess whether a series counts visitors or page views from its `math`
/// and display names. `None` when nothing gives it away.
fn classify(row: &Value) -> Option<SeriesKind> {
    let math = row
        .get("math")
        .or_else(|| row.get("action").and_then(|a| a.get("math")))
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase);
    if let Some(math) = math.as_deref() {
        if VISITOR_MATHS.contains(&math) {
            return Some(SeriesKind::Visitors);
        }
        if math == "total" {
            return Some(SeriesKind::Pageviews);
        }
    }

    let name = series_name(row);
    if name.contains("visitor") || name.contains("unique") || name.contains("user") {
        Some(SeriesKind::Visitors)
    } else if name.contains("pageview") || name.contains("page view") || name.contains("views") {
        Some(SeriesKind::Pageviews)
    } else {
        None
    }
}

fn series_points(row: &Value) -> Vec<f64> {
    row.get("data")
        .and_then(Value::as_array)
        .map(|data| data.iter().map(|v| extract::number(v).unwrap_or(0.0)).collect())
        .unwrap_or_default()
}

fn series_labels(row: &Value) -> Vec<String> {
    row.get("labels")
        .or_else(|| row.get("days"))
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .map(|l| match l {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn fragment(visitors: &Value, pageviews: Option<&Value>) -> TrafficFragment {
    TrafficFragment {
        series: series_points(visitors),
        labels: series_labels(visitors),
        unique_users: extract::row_total(visitors),
        pageviews: pageviews.map(extract::row_total).unwrap_or(0.0),
    }
}

/// First series is unique visitors, second (if any) is page views.
fn parse_positional(rows: &[&Value]) -> TrafficFragment {
    match rows {
        [] => TrafficFragment::default(),
        [visitors] => fragment(visitors, None),
        [visitors, pageviews, ..] => fragment(visitors, Some(*pageviews)),
    }
}

#[derive(Default)]
struct Slots<'a> {
    visitors: Option<&'a Value>,
    pageviews: Option<&'a Value>,
}

impl<'a> Slots<'a> {
    fn place(&mut self, kind: Option<SeriesKind>, row: &'a Value) {
        let slot = match kind {
            Some(SeriesKind::Visitors) => &mut self.visitors,
            Some(SeriesKind::Pageviews) => &mut self.pageviews,
            None if self.visitors.is_none() => &mut self.visitors,
            None => &mut self.pageviews,
        };
        if slot.is_none() {
            *slot = Some(row);
        }
    }

    fn complete(&self) -> Option<TrafficFragment> {
        Some(fragment(self.visitors?, Some(self.pageviews?)))
    }
}

/// Identify current/previous × visitors/pageviews. `None` unless all four
/// series are found.
fn parse_labeled(rows: &[Value]) -> Option<Periods<TrafficFragment>> {
    let mut current = Slots::default();
    let mut previous = Slots::default();
    for row in rows {
        match extract::compare_period(row)? {
            Period::Current => current.place(classify(row), row),
            Period::Previous => previous.place(classify(row), row),
        }
    }
    Some(Periods::with_previous(current.complete()?, previous.complete()?))
}

/// Traffic fragment from a trends payload.
///
/// With `has_comparison`, every series must carry a `compare_label` and the
/// four expected series must all be identified; otherwise the payload is
/// parsed positionally over its current-period rows with no previous data.
pub fn parse_traffic(raw: &Value, has_comparison: bool) -> Periods<TrafficFragment> {
    let rows = envelope::rows(raw);
    if has_comparison {
        if let Some(periods) = parse_labeled(rows) {
            return periods;
        }
        debug!(
            series = rows.len(),
            "traffic comparison series not identified, parsing current period only"
        );
    }
    let (current, _) = extract::partition_by_period(rows, has_comparison);
    Periods::current_only(parse_positional(&current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn series(math: &str, label: &str, data: &[f64], compare_label: Option<&str>) -> Value {
        let mut row = json!({
            "math": math,
            "label": label,
            "data": data,
            "labels": (1..=data.len()).map(|d| format!("Day {d}")).collect::<Vec<_>>(),
        });
        if let Some(compare_label) = compare_label {
            row["compare_label"] = json!(compare_label);
        }
        row
    }

    #[test]
    fn two_series_by_position() {
        let raw = json!({ "results": [
            series("dau", "$pageview", &[1.0, 2.0, 3.0], None),
            series("total", "$pageview", &[5.0, 5.0, 5.0], None),
        ]});
        let parsed = parse_traffic(&raw, false);
        assert_eq!(parsed.current.unique_users, 6.0);
        assert_eq!(parsed.current.pageviews, 15.0);
        assert_eq!(parsed.current.series, vec![1.0, 2.0, 3.0]);
        assert_eq!(parsed.current.labels.len(), 3);
        assert!(parsed.previous.is_none());
    }

    #[test]
    fn explicit_count_takes_precedence() {
        let mut visitors = series("dau", "$pageview", &[1.0, 2.0], None);
        visitors["aggregated_value"] = json!(2.0);
        let raw = json!([visitors]);
        let parsed = parse_traffic(&raw, false);
        assert_eq!(parsed.current.unique_users, 2.0);
        assert_eq!(parsed.current.pageviews, 0.0);
    }

    #[test]
    fn comparison_matches_series_by_label_and_math() {
        // Order deliberately scrambled.
        let raw = json!({ "result": [
            series("total", "$pageview", &[40.0], Some("previous")),
            series("dau", "$pageview", &[10.0], Some("current")),
            series("dau", "$pageview", &[8.0], Some("previous")),
            series("total", "$pageview", &[50.0], Some("current")),
        ]});
        let parsed = parse_traffic(&raw, true);
        let previous = parsed.previous.expect("previous period");
        assert_eq!(parsed.current.unique_users, 10.0);
        assert_eq!(parsed.current.pageviews, 50.0);
        assert_eq!(previous.unique_users, 8.0);
        assert_eq!(previous.pageviews, 40.0);
    }

    #[test]
    fn custom_names_identify_series_without_math() {
        let raw = json!([
            { "custom_name": "Page views", "data": [7], "compare_label": "current" },
            { "custom_name": "Unique visitors", "data": [3], "compare_label": "current" },
            { "custom_name": "Page views", "data": [6], "compare_label": "previous" },
            { "custom_name": "Unique visitors", "data": [2], "compare_label": "previous" },
        ]);
        let parsed = parse_traffic(&raw, true);
        assert_eq!(parsed.current.unique_users, 3.0);
        assert_eq!(parsed.current.pageviews, 7.0);
        assert_eq!(parsed.previous.expect("previous").unique_users, 2.0);
    }

    #[test]
    fn incomplete_comparison_falls_back_to_current_only() {
        let raw = json!([
            series("dau", "$pageview", &[10.0], Some("current")),
            series("total", "$pageview", &[50.0], Some("current")),
            series("dau", "$pageview", &[8.0], Some("previous")),
        ]);
        let parsed = parse_traffic(&raw, true);
        assert!(parsed.previous.is_none());
        assert_eq!(parsed.current.unique_users, 10.0);
        assert_eq!(parsed.current.pageviews, 50.0);
    }

    #[test]
    fn unlabeled_comparison_falls_back_positionally() {
        let raw = json!([
            series("dau", "$pageview", &[4.0], None),
            series("total", "$pageview", &[9.0], None),
        ]);
        let parsed = parse_traffic(&raw, true);
        assert!(parsed.previous.is_none());
        assert_eq!(parsed.current.unique_users, 4.0);
        assert_eq!(parsed.current.pageviews, 9.0);
    }

    #[test]
    fn empty_payloads() {
        for raw in [json!([]), json!({ "results": [] }), json!({ "result": [] })] {
            assert_eq!(parse_traffic(&raw, false).current, TrafficFragment::default());
            assert_eq!(parse_traffic(&raw, true).current, TrafficFragment::default());
        }
    }
}
