//! One pure parser per metric family.
//!
//! Parsers never fail: malformed or empty payloads produce the family's
//! empty fragment or a degraded-but-valid one.

pub mod device;
pub mod funnel;
pub mod geography;
pub mod lifecycle;
pub mod retention;
pub mod scalar;
pub mod top;
pub mod traffic;

use serde::Serialize;
use serde_json::Value;

use kpilens_core::{
    daterange::DateRangeToken,
    error::CoreError,
    family::MetricFamily,
    fragment::{
        CityGeographyFragment, DeviceMixFragment, FunnelFragment, GeographyFragment,
        LifecycleFragment, Periods, RetentionFragment, ScalarFragment, TopEntriesFragment,
        TrafficFragment,
    },
    merge::{merge, merge_periods, ComparisonFragment},
};

pub use device::parse_device_mix;
pub use funnel::parse_funnel;
pub use geography::{parse_city_geography, parse_geography};
pub use lifecycle::parse_lifecycle;
pub use retention::parse_retention;
pub use scalar::{parse_bounce_rate, parse_session_duration, parse_sessions};
pub use top::{parse_referring_domains, parse_top_pages};
pub use traffic::parse_traffic;

/// Family-independent inputs a parser may need.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    /// The payload holds both periods, told apart by `compare_label`.
    pub has_comparison: bool,
    pub range: DateRangeToken,
    pub cumulative_retention: bool,
}

fn parse_with<T: Serialize>(
    family: MetricFamily,
    current: &Value,
    previous: Option<&Value>,
    has_comparison: bool,
    parse: impl Fn(&Value, bool) -> Periods<T>,
) -> Result<ComparisonFragment, CoreError> {
    let mut periods = parse(current, has_comparison);
    if let Some(previous) = previous {
        periods.previous = Some(parse(previous, false).current);
    }
    merge_periods(&periods, family)
}

/// Parse `current` (and a separately fetched `previous` payload, if any)
/// into the family's wire fragment.
pub fn parse_family(
    family: MetricFamily,
    current: &Value,
    previous: Option<&Value>,
    ctx: ParseContext,
) -> Result<ComparisonFragment, CoreError> {
    let cmp = ctx.has_comparison;
    match family {
        MetricFamily::Traffic => parse_with(family, current, previous, cmp, parse_traffic),
        MetricFamily::Device => parse_with(family, current, previous, cmp, parse_device_mix),
        MetricFamily::Geography => parse_with(family, current, previous, cmp, parse_geography),
        MetricFamily::CityGeography => {
            parse_with(family, current, previous, cmp, parse_city_geography)
        }
        MetricFamily::Sessions => parse_with(family, current, previous, cmp, parse_sessions),
        MetricFamily::SessionDuration => {
            parse_with(family, current, previous, cmp, parse_session_duration)
        }
        MetricFamily::TopPages => parse_with(family, current, previous, cmp, parse_top_pages),
        MetricFamily::ReferringSources => {
            parse_with(family, current, previous, cmp, parse_referring_domains)
        }
        MetricFamily::Funnel => parse_with(family, current, previous, false, |raw, _| {
            Periods::current_only(parse_funnel(raw))
        }),
        MetricFamily::Lifecycle => parse_with(family, current, previous, false, |raw, _| {
            Periods::current_only(parse_lifecycle(raw))
        }),
        MetricFamily::Retention => parse_with(family, current, previous, false, |raw, _| {
            Periods::current_only(parse_retention(raw, ctx.range, ctx.cumulative_retention))
        }),
        MetricFamily::BounceRate => parse_with(family, current, previous, false, |raw, _| {
            Periods::current_only(parse_bounce_rate(raw))
        }),
    }
}

/// The family's documented empty fragment, with no `previous_*` fields.
pub fn empty_fragment(family: MetricFamily) -> Result<ComparisonFragment, CoreError> {
    match family {
        MetricFamily::Traffic => merge(&TrafficFragment::default(), None, family),
        MetricFamily::Funnel => merge(&FunnelFragment::default(), None, family),
        MetricFamily::Lifecycle => merge(&LifecycleFragment::default(), None, family),
        MetricFamily::Device => merge(&DeviceMixFragment::default(), None, family),
        MetricFamily::Retention => merge(&RetentionFragment::default(), None, family),
        MetricFamily::Geography => merge(&GeographyFragment::default(), None, family),
        MetricFamily::CityGeography => merge(&CityGeographyFragment::default(), None, family),
        MetricFamily::TopPages | MetricFamily::ReferringSources => {
            merge(&TopEntriesFragment::default(), None, family)
        }
        MetricFamily::Sessions | MetricFamily::SessionDuration | MetricFamily::BounceRate => {
            merge(&ScalarFragment::default(), None, family)
        }
    }
}
