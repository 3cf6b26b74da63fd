use std::collections::BTreeMap;

use serde::Serialize;

use crate::{family::MetricFamily, merge::ComparisonFragment};

#[derive(Debug, Clone, Default, Serialize)]
pub struct KpiMeta {
    /// Family wire name → human-readable failure reason.
    pub errors: BTreeMap<String, String>,
    #[serde(rename = "dateRange")]
    pub date_range: String,
    #[serde(rename = "comparisonEnabled")]
    pub comparison_enabled: bool,
}

/// Everything the dashboard renders for one tenant and date range.
///
/// Families the tenant has not configured stay `None` and are left out of
/// the serialized object; configured families are always present, even
/// when their upstream call failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KpiResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funnel: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geography: Option<ComparisonFragment>,
    #[serde(rename = "cityGeography", skip_serializing_if = "Option::is_none")]
    pub city_geography: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<ComparisonFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounce_rate: Option<ComparisonFragment>,
    #[serde(rename = "topPages", skip_serializing_if = "Option::is_none")]
    pub top_pages: Option<ComparisonFragment>,
    #[serde(rename = "referringSources", skip_serializing_if = "Option::is_none")]
    pub referring_sources: Option<ComparisonFragment>,
    pub meta: KpiMeta,
}

impl KpiResult {
    pub fn new(date_range: &str, comparison_enabled: bool) -> Self {
        Self {
            meta: KpiMeta {
                errors: BTreeMap::new(),
                date_range: date_range.to_string(),
                comparison_enabled,
            },
            ..Self::default()
        }
    }

    fn slot_mut(&mut self, family: MetricFamily) -> &mut Option<ComparisonFragment> {
        match family {
            MetricFamily::Traffic => &mut self.traffic,
            MetricFamily::Funnel => &mut self.funnel,
            MetricFamily::Lifecycle => &mut self.lifecycle,
            MetricFamily::Device => &mut self.device,
            MetricFamily::Retention => &mut self.retention,
            MetricFamily::Geography => &mut self.geography,
            MetricFamily::CityGeography => &mut self.city_geography,
            MetricFamily::Sessions => &mut self.sessions,
            MetricFamily::SessionDuration => &mut self.session_duration,
            MetricFamily::BounceRate => &mut self.bounce_rate,
            MetricFamily::TopPages => &mut self.top_pages,
            MetricFamily::ReferringSources => &mut self.referring_sources,
        }
    }

    pub fn family(&self, family: MetricFamily) -> Option<&ComparisonFragment> {
        match family {
            MetricFamily::Traffic => self.traffic.as_ref(),
            MetricFamily::Funnel => self.funnel.as_ref(),
            MetricFamily::Lifecycle => self.lifecycle.as_ref(),
            MetricFamily::Device => self.device.as_ref(),
            MetricFamily::Retention => self.retention.as_ref(),
            MetricFamily::Geography => self.geography.as_ref(),
            MetricFamily::CityGeography => self.city_geography.as_ref(),
            MetricFamily::Sessions => self.sessions.as_ref(),
            MetricFamily::SessionDuration => self.session_duration.as_ref(),
            MetricFamily::BounceRate => self.bounce_rate.as_ref(),
            MetricFamily::TopPages => self.top_pages.as_ref(),
            MetricFamily::ReferringSources => self.referring_sources.as_ref(),
        }
    }

    pub fn set_family(&mut self, family: MetricFamily, fragment: ComparisonFragment) {
        *self.slot_mut(family) = Some(fragment);
    }

    pub fn record_error(&mut self, family: MetricFamily, reason: impl Into<String>) {
        self.meta
            .errors
            .insert(family.wire_name().to_string(), reason.into());
    }
}
