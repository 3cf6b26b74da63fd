use std::fmt;

use serde::{Deserialize, Serialize};

/// One named KPI category. The serde names double as the property names of
/// the assembled KPI object and as the keys of a tenant's template map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricFamily {
    #[serde(rename = "traffic")]
    Traffic,
    #[serde(rename = "funnel")]
    Funnel,
    #[serde(rename = "lifecycle")]
    Lifecycle,
    #[serde(rename = "device")]
    Device,
    #[serde(rename = "retention")]
    Retention,
    #[serde(rename = "geography")]
    Geography,
    #[serde(rename = "cityGeography")]
    CityGeography,
    #[serde(rename = "sessions")]
    Sessions,
    #[serde(rename = "session_duration")]
    SessionDuration,
    #[serde(rename = "bounce_rate")]
    BounceRate,
    #[serde(rename = "topPages")]
    TopPages,
    #[serde(rename = "referringSources")]
    ReferringSources,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 12] = [
        MetricFamily::Traffic,
        MetricFamily::Funnel,
        MetricFamily::Lifecycle,
        MetricFamily::Device,
        MetricFamily::Retention,
        MetricFamily::Geography,
        MetricFamily::CityGeography,
        MetricFamily::Sessions,
        MetricFamily::SessionDuration,
        MetricFamily::BounceRate,
        MetricFamily::TopPages,
        MetricFamily::ReferringSources,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Traffic => "traffic",
            Self::Funnel => "funnel",
            Self::Lifecycle => "lifecycle",
            Self::Device => "device",
            Self::Retention => "retention",
            Self::Geography => "geography",
            Self::CityGeography => "cityGeography",
            Self::Sessions => "sessions",
            Self::SessionDuration => "session_duration",
            Self::BounceRate => "bounce_rate",
            Self::TopPages => "topPages",
            Self::ReferringSources => "referringSources",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
