//! Shared output vocabulary of the analyzers.

use serde::{Deserialize, Serialize};

use adsim_core::MetricKind;

/// Where a campaign value sits relative to its benchmark median.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Above,
    At,
    Below,
}

/// Percentile tier of a comparison.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Excellent,
    Good,
    Average,
    Poor,
    Critical,
}

impl Significance {
    /// Tier for a percentile rank: >=90 excellent, >=75 good, >=50 average,
    /// >=25 poor, else critical.
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 90.0 {
            Significance::Excellent
        } else if percentile >= 75.0 {
            Significance::Good
        } else if percentile >= 50.0 {
            Significance::Average
        } else if percentile >= 25.0 {
            Significance::Poor
        } else {
            Significance::Critical
        }
    }
}

/// Kind of narrative insight an analysis produces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Strength,
    Weakness,
    Opportunity,
    Threat,
}

/// Relative weight of an insight when sorting for display.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// A narrative finding attached to an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub impact: Impact,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricKind>,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        impact: Impact,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            impact,
            title: title.into(),
            detail: detail.into(),
            metric: None,
        }
    }

    pub fn for_metric(mut self, metric: MetricKind) -> Self {
        self.metric = Some(metric);
        self
    }
}

/// Estimated effort to act on a recommendation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

/// An actionable suggestion, ranked by priority (0-100, higher first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: u8,
    pub effort: Effort,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
}

/// Sort insights by impact, high first. Stable, so ties keep insertion order.
pub fn sort_insights(insights: &mut [Insight]) {
    insights.sort_by(|a, b| b.impact.cmp(&a.impact));
}

/// Sort recommendations by priority, descending. Stable.
pub fn sort_recommendations(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
}
