//! Folding a previous-period fragment into the current one.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{error::CoreError, family::MetricFamily, fragment::Periods};

pub const PREVIOUS_PREFIX: &str = "previous_";

/// The wire form of one family: the current fragment's fields, plus
/// `previous_<field>` siblings when previous-period data exists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonFragment {
    fields: Map<String, Value>,
}

impl ComparisonFragment {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn has_previous(&self) -> bool {
        self.fields.keys().any(|k| k.starts_with(PREVIOUS_PREFIX))
    }
}

impl Serialize for ComparisonFragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

fn to_fields<T: Serialize>(fragment: &T, family: MetricFamily) -> Result<Map<String, Value>, CoreError> {
    match serde_json::to_value(fragment)? {
        Value::Object(map) => Ok(map),
        _ => Err(CoreError::NotAnObject(family.wire_name())),
    }
}

/// Copy every field of `previous` next to `current` under a `previous_` key.
///
/// Values are copied, never recomputed. With no previous fragment the result
/// carries no `previous_*` keys at all.
pub fn merge<T: Serialize>(
    current: &T,
    previous: Option<&T>,
    family: MetricFamily,
) -> Result<ComparisonFragment, CoreError> {
    let mut fields = to_fields(current, family)?;
    if let Some(previous) = previous {
        for (key, value) in to_fields(previous, family)? {
            fields.insert(format!("{PREVIOUS_PREFIX}{key}"), value);
        }
    }
    Ok(ComparisonFragment { fields })
}

pub fn merge_periods<T: Serialize>(
    periods: &Periods<T>,
    family: MetricFamily,
) -> Result<ComparisonFragment, CoreError> {
    merge(&periods.current, periods.previous.as_ref(), family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{DeviceMixFragment, TrafficFragment};

    #[test]
    fn previous_fields_mirror_current_fields() {
        let current = TrafficFragment {
            series: vec![1.0, 2.0],
            labels: vec!["a".into(), "b".into()],
            unique_users: 3.0,
            pageviews: 9.0,
        };
        let previous = TrafficFragment {
            unique_users: 2.0,
            pageviews: 4.0,
            ..TrafficFragment::default()
        };

        let merged = merge(&current, Some(&previous), MetricFamily::Traffic).expect("merge");

        assert_eq!(merged.get("unique_users"), Some(&serde_json::json!(3.0)));
        assert_eq!(merged.get("previous_unique_users"), Some(&serde_json::json!(2.0)));
        assert_eq!(merged.get("previous_pageviews"), Some(&serde_json::json!(4.0)));
        assert_eq!(merged.get("previous_series"), Some(&serde_json::json!([])));
        for key in ["series", "labels", "unique_users", "pageviews"] {
            assert!(merged.contains_key(&format!("previous_{key}")), "missing previous_{key}");
        }
    }

    #[test]
    fn missing_previous_attaches_nothing() {
        let merged = merge(&DeviceMixFragment::default(), None, MetricFamily::Device).expect("merge");
        assert!(!merged.has_previous());
        assert!(!merged.contains_key("previous_device_mix"));
        assert!(merged.contains_key("device_mix"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let merged = merge(&DeviceMixFragment::default(), None, MetricFamily::Device).expect("merge");
        let value = serde_json::to_value(&merged).expect("serialize");
        assert_eq!(value, serde_json::json!({ "device_mix": {} }));
    }
}
