use std::collections::BTreeMap;

use serde_json::Value;

use kpilens_core::fragment::{CityEntry, CityGeographyFragment, GeographyFragment, Periods};

use super::device::{shares, UNKNOWN};
use crate::{envelope, extract};

/// `[country, city]` from a row's breakdown, each `"Unknown"` when absent.
fn country_and_city(row: &Value) -> (String, String) {
    let parts = extract::breakdown_parts(row);
    let country = parts
        .first()
        .cloned()
        .flatten()
        .map(|c| c.to_uppercase())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let city = parts
        .get(1)
        .cloned()
        .flatten()
        .unwrap_or_else(|| UNKNOWN.to_string());
    (country, city)
}

fn is_unknown(value: &str) -> bool {
    value.eq_ignore_ascii_case(UNKNOWN)
}

fn countries(rows: &[&Value]) -> GeographyFragment {
    let mut countries = BTreeMap::new();
    for row in rows {
        let count = extract::row_total(row);
        let (country, _) = country_and_city(row);
        if count <= 0.0 || is_unknown(&country) {
            continue;
        }
        *countries.entry(country).or_insert(0.0) += count;
    }
    GeographyFragment {
        country_shares: shares(&countries),
        countries,
    }
}

fn cities(rows: &[&Value]) -> CityGeographyFragment {
    let mut cities: BTreeMap<String, CityEntry> = BTreeMap::new();
    for row in rows {
        let count = extract::row_total(row);
        let (country, city) = country_and_city(row);
        if count <= 0.0 || is_unknown(&city) {
            continue;
        }
        cities
            .entry(format!("{city}, {country}"))
            .and_modify(|entry| entry.count += count)
            .or_insert(CityEntry {
                city,
                country,
                count,
            });
    }
    CityGeographyFragment { cities }
}

fn split<T>(
    raw: &Value,
    has_comparison: bool,
    build: impl Fn(&[&Value]) -> T,
) -> Periods<T> {
    let (current, previous) = extract::partition_by_period(envelope::rows(raw), has_comparison);
    if has_comparison {
        Periods::with_previous(build(&current), build(&previous))
    } else {
        Periods::current_only(build(&current))
    }
}

/// Country counts from a breakdown-by-country trends payload.
///
/// Codes are upper-cased; unknown codes and non-positive counts are dropped.
pub fn parse_geography(raw: &Value, has_comparison: bool) -> Periods<GeographyFragment> {
    split(raw, has_comparison, countries)
}

/// City counts keyed `"{city}, {country}"` from a `[country, city]`
/// breakdown. A city needs a known name; its country may be unknown.
pub fn parse_city_geography(raw: &Value, has_comparison: bool) -> Periods<CityGeographyFragment> {
    split(raw, has_comparison, cities)
}
