use serde_json::Value;

use kpilens_core::fragment::{FunnelFragment, FunnelStep, TopDrop};

use crate::{envelope, extract};

/// Breakdown funnels nest one step list per breakdown value; the first list
/// stands for the whole funnel.
fn step_rows(raw: &Value) -> &[Value] {
    let rows = envelope::rows(raw);
    match rows.first() {
        Some(Value::Array(nested)) => nested,
        _ => rows,
    }
}

fn step_name(row: &Value, index: usize) -> String {
    ["custom_name", "name"]
        .iter()
        .find_map(|key| {
            row.get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("Step {}", index + 1))
}

fn top_drop(steps: &[FunnelStep]) -> TopDrop {
    let mut best = TopDrop::default();
    let mut best_rate: Option<f64> = None;
    for pair in steps.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.count <= 0.0 {
            continue;
        }
        let rate = (a.count - b.count) / a.count;
        // Strict comparison: the first of equal drops wins.
        if best_rate.map_or(true, |leading| rate > leading) {
            best_rate = Some(rate);
            best = TopDrop {
                from: a.name.clone(),
                to: b.name.clone(),
                drop_rate: rate,
            };
        }
    }
    best
}

/// Funnel fragment from a funnels payload.
pub fn parse_funnel(raw: &Value) -> FunnelFragment {
    let steps: Vec<FunnelStep> = step_rows(raw)
        .iter()
        .enumerate()
        .map(|(index, row)| FunnelStep {
            name: step_name(row, index),
            count: row.get("count").and_then(extract::number).unwrap_or(0.0),
        })
        .collect();

    let conversion_rate = match (steps.first(), steps.last()) {
        (Some(first), Some(last)) if first.count > 0.0 => last.count / first.count,
        _ => 0.0,
    };

    // Each step reports the median time from the previous step.
    let median_time_to_convert_sec = step_rows(raw)
        .iter()
        .filter_map(|row| row.get("median_conversion_time").and_then(extract::number))
        .sum();

    FunnelFragment {
        top_drop: top_drop(&steps),
        steps,
        conversion_rate,
        median_time_to_convert_sec,
    }
}
