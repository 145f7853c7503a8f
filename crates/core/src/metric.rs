//! Shared enumerations: metric kinds, channels, subscription tiers.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The fixed set of campaign metrics the pipeline can score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Ctr,
    Impressions,
    Engagement,
    Reach,
    Conversions,
    Cpc,
    Cpm,
}

impl MetricKind {
    /// All metric kinds, in canonical order.
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Ctr,
        MetricKind::Impressions,
        MetricKind::Engagement,
        MetricKind::Reach,
        MetricKind::Conversions,
        MetricKind::Cpc,
        MetricKind::Cpm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Ctr => "ctr",
            MetricKind::Impressions => "impressions",
            MetricKind::Engagement => "engagement",
            MetricKind::Reach => "reach",
            MetricKind::Conversions => "conversions",
            MetricKind::Cpc => "cpc",
            MetricKind::Cpm => "cpm",
        }
    }

    /// Whether a larger value is better for this metric.
    ///
    /// Cost metrics (CPC, CPM) invert the usual reading: a value far above
    /// benchmark is a weakness, not a strength. The scorer keys off this.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, MetricKind::Cpc | MetricKind::Cpm)
    }
}

impl core::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ctr" => Ok(MetricKind::Ctr),
            "impressions" => Ok(MetricKind::Impressions),
            "engagement" => Ok(MetricKind::Engagement),
            "reach" => Ok(MetricKind::Reach),
            "conversions" => Ok(MetricKind::Conversions),
            "cpc" => Ok(MetricKind::Cpc),
            "cpm" => Ok(MetricKind::Cpm),
            other => Err(DomainError::validation(format!(
                "unknown metric kind: {other}"
            ))),
        }
    }
}

/// Advertising channel a campaign runs on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Search,
    Social,
    Display,
    Video,
    Email,
    /// Channel outside the fixed set (platform-specific).
    Other(String),
}

impl Channel {
    pub fn name(&self) -> &str {
        match self {
            Channel::Search => "search",
            Channel::Social => "social",
            Channel::Display => "display",
            Channel::Video => "video",
            Channel::Email => "email",
            Channel::Other(name) => name,
        }
    }

    /// Channels considered when looking for untapped channel opportunities.
    pub fn standard() -> [Channel; 5] {
        [
            Channel::Search,
            Channel::Social,
            Channel::Display,
            Channel::Video,
            Channel::Email,
        ]
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Subscription plan of the requesting organization.
///
/// Queue priority derives from the tier unless the caller overrides it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Starter,
    Professional,
    Enterprise,
}

impl SubscriptionTier {
    /// Default queue priority for the tier (higher is served first).
    pub fn default_priority(&self) -> i32 {
        match self {
            SubscriptionTier::Free => 1,
            SubscriptionTier::Starter => 3,
            SubscriptionTier::Professional => 5,
            SubscriptionTier::Enterprise => 10,
        }
    }
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        SubscriptionTier::Free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_kind_round_trips_through_str() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.as_str().parse::<MetricKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_metric_kind_is_rejected() {
        assert!("bounce_rate".parse::<MetricKind>().is_err());
    }

    #[test]
    fn cost_metrics_invert_direction() {
        assert!(!MetricKind::Cpc.higher_is_better());
        assert!(!MetricKind::Cpm.higher_is_better());
        assert!(MetricKind::Ctr.higher_is_better());
    }

    #[test]
    fn tier_priorities_are_ordered() {
        assert!(
            SubscriptionTier::Enterprise.default_priority()
                > SubscriptionTier::Professional.default_priority()
        );
        assert!(
            SubscriptionTier::Professional.default_priority()
                > SubscriptionTier::Free.default_priority()
        );
    }
}
