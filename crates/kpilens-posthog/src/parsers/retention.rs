use serde_json::Value;

use kpilens_core::{
    daterange::DateRangeToken,
    fragment::{RetentionFragment, RetentionValue},
};

use crate::{envelope, extract};

/// Retention queries return at most this many intervals per cohort.
pub const MAX_INTERVALS: usize = 8;

/// One cohort's counts by day offset, day 0 first.
fn cohort_counts(row: &Value) -> Vec<f64> {
    let cells = match row {
        Value::Array(cells) => cells.as_slice(),
        other => match other.get("values").and_then(Value::as_array) {
            Some(cells) => cells.as_slice(),
            None => &[],
        },
    };
    cells
        .iter()
        .take(MAX_INTERVALS)
        .map(|cell| match cell {
            Value::Object(_) => cell.get("count").and_then(extract::number),
            other => extract::number(other),
        })
        .map(|count| count.unwrap_or(0.0))
        .collect()
}

fn percentage(count: f64, base: f64) -> f64 {
    if base > 0.0 {
        count * 100.0 / base
    } else {
        0.0
    }
}

fn curve(counts: &[f64], last_day: usize) -> Vec<RetentionValue> {
    let base = counts.first().copied().unwrap_or(0.0);
    (0..=last_day)
        .map(|day| {
            let count = counts.get(day).copied().unwrap_or(0.0);
            RetentionValue {
                day,
                count,
                percentage: percentage(count, base),
            }
        })
        .collect()
}

/// The cohort with the highest retention on `day`, ties going to the larger
/// day-0 cohort and then to the earlier cohort.
fn most_retained(cohorts: &[Vec<f64>], day: usize) -> Option<&Vec<f64>> {
    let mut best: Option<(&Vec<f64>, f64)> = None;
    for cohort in cohorts {
        let size = cohort.first().copied().unwrap_or(0.0);
        if size <= 0.0 {
            continue;
        }
        let ratio = cohort.get(day).copied().unwrap_or(0.0) / size;
        let better = match best {
            None => true,
            Some((leader, leader_ratio)) => {
                ratio > leader_ratio || (ratio == leader_ratio && size > leader[0])
            }
        };
        if better {
            best = Some((cohort, ratio));
        }
    }
    best.map(|(cohort, _)| cohort)
}

/// Per-day totals across the cohorts observed on that day. Each day's
/// percentage is taken against the day-0 sizes of those same cohorts.
fn pooled(cohorts: &[Vec<f64>], last_day: usize) -> Vec<RetentionValue> {
    (0..=last_day)
        .map(|day| {
            let (base, count) = cohorts
                .iter()
                .filter(|c| c.len() > day)
                .fold((0.0, 0.0), |(base, count), c| (base + c[0], count + c[day]));
            RetentionValue {
                day,
                count,
                percentage: percentage(count, base),
            }
        })
        .collect()
}

/// Retention fragment from a retention payload.
///
/// The reported day is `min(days for the range, available days - 1)`.
/// Non-cumulative mode reports the single best-retaining cohort; cumulative
/// mode pools all cohorts, weighting each by its size.
pub fn parse_retention(
    raw: &Value,
    range: DateRangeToken,
    is_cumulative: bool,
) -> RetentionFragment {
    let cohorts: Vec<Vec<f64>> = envelope::rows(raw)
        .iter()
        .map(cohort_counts)
        .filter(|counts| !counts.is_empty())
        .collect();

    let available = cohorts.iter().map(Vec::len).max().unwrap_or(0);
    if available == 0 || !cohorts.iter().any(|c| c[0] > 0.0) {
        return RetentionFragment::default();
    }
    let last_day = range.retention_days().min(available - 1);

    let values = if is_cumulative {
        pooled(&cohorts, last_day)
    } else {
        match most_retained(&cohorts, last_day) {
            Some(cohort) => curve(cohort, last_day),
            None => return RetentionFragment::default(),
        }
    };

    RetentionFragment {
        d7_retention: values.last().map(|v| v.percentage).unwrap_or(0.0),
        values,
    }
}
