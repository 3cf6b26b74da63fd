use serde_json::Value;
use tracing::warn;

use kpilens_core::fragment::{Periods, ScalarFragment};

use crate::{envelope, extract};

/// Stand-in for a row object without a `bounce_rate` column.
static MISSING: Value = Value::Null;

/// Pull the single value a HogQL bounce-rate query returns, whether it comes
/// back as `[[x]]`, `[{"bounce_rate": x}]` or `[x]`.
fn bounce_cell(raw: &Value) -> Option<&Value> {
    let first = envelope::rows(raw).first()?;
    match first {
        Value::Array(cells) => cells.first(),
        Value::Object(fields) => Some(fields.get("bounce_rate").unwrap_or(&MISSING)),
        scalar => Some(scalar),
    }
}

/// Bounce rate as reported upstream; non-numeric results become 0.
pub fn parse_bounce_rate(raw: &Value) -> ScalarFragment {
    let Some(cell) = bounce_cell(raw) else {
        return ScalarFragment::default();
    };
    match extract::number(cell) {
        Some(value) => ScalarFragment { value },
        None => {
            warn!(value = %cell, "bounce rate is not a finite number, reporting 0");
            ScalarFragment::default()
        }
    }
}

fn first_series_by_period(
    raw: &Value,
    has_comparison: bool,
    reduce: fn(&Value) -> f64,
) -> Periods<ScalarFragment> {
    let (current, previous) = extract::partition_by_period(envelope::rows(raw), has_comparison);
    let value = |rows: &[&Value]| ScalarFragment {
        value: rows.first().map(|row| reduce(row)).unwrap_or(0.0),
    };
    if has_comparison {
        Periods::with_previous(value(&current), value(&previous))
    } else {
        Periods::current_only(value(&current))
    }
}

/// Session count: the first series' explicit total, else its sum.
pub fn parse_sessions(raw: &Value, has_comparison: bool) -> Periods<ScalarFragment> {
    first_series_by_period(raw, has_comparison, extract::row_total)
}

/// Mean session duration in seconds: the first series' aggregated value,
/// else the mean of its points.
pub fn parse_session_duration(raw: &Value, has_comparison: bool) -> Periods<ScalarFragment> {
    first_series_by_period(raw, has_comparison, extract::row_average)
}
