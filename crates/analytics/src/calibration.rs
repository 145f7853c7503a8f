//! Data-driven heuristic constants used by the analyzers and the built-in
//! forecast model.
//!
//! All defaults here are **placeholders**; none were derived from a
//! documented calibration run. Deployments load tuned values from
//! configuration instead of patching code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use adsim_core::MetricKind;

/// Tunable constants for scoring and impact estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationTable {
    /// Signed per-metric coefficients applied to the competitor activity
    /// multiplier (positive = metric degrades under pressure, e.g. CPC up).
    pub impact_coefficients: BTreeMap<MetricKind, f64>,
    /// Divisor turning total activity volume into the impact multiplier.
    pub activity_volume_divisor: f64,
    /// Cap on the activity impact multiplier.
    pub activity_impact_cap: f64,
    /// Budget estimate per unit of observed activity volume, used when no
    /// spend observations exist for a competitor.
    pub budget_per_volume_unit: f64,
    /// Industry-level scaling applied by the built-in forecast model.
    pub industry_multipliers: BTreeMap<String, f64>,
    /// Per-channel base response rates for the built-in forecast model.
    pub channel_base_rates: BTreeMap<String, f64>,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        let mut impact_coefficients = BTreeMap::new();
        impact_coefficients.insert(MetricKind::Cpc, 0.15);
        impact_coefficients.insert(MetricKind::Cpm, 0.12);
        impact_coefficients.insert(MetricKind::Impressions, -0.20);
        impact_coefficients.insert(MetricKind::Reach, -0.15);
        impact_coefficients.insert(MetricKind::Ctr, -0.10);
        impact_coefficients.insert(MetricKind::Engagement, -0.08);
        impact_coefficients.insert(MetricKind::Conversions, -0.12);

        let mut industry_multipliers = BTreeMap::new();
        industry_multipliers.insert("technology".to_string(), 1.1);
        industry_multipliers.insert("retail".to_string(), 1.0);
        industry_multipliers.insert("finance".to_string(), 0.9);
        industry_multipliers.insert("healthcare".to_string(), 0.85);

        let mut channel_base_rates = BTreeMap::new();
        channel_base_rates.insert("search".to_string(), 1.0);
        channel_base_rates.insert("social".to_string(), 0.85);
        channel_base_rates.insert("display".to_string(), 0.6);
        channel_base_rates.insert("video".to_string(), 0.75);
        channel_base_rates.insert("email".to_string(), 0.9);

        Self {
            impact_coefficients,
            activity_volume_divisor: 1000.0,
            activity_impact_cap: 0.3,
            budget_per_volume_unit: 25.0,
            industry_multipliers,
            channel_base_rates,
        }
    }
}

impl CalibrationTable {
    /// Load a table from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Impact multiplier for a competitor's total activity volume:
    /// `min(volume / divisor, cap)`.
    pub fn activity_multiplier(&self, total_volume: f64) -> f64 {
        (total_volume / self.activity_volume_divisor).min(self.activity_impact_cap)
    }

    pub fn impact_coefficient(&self, metric: MetricKind) -> f64 {
        self.impact_coefficients.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn industry_multiplier(&self, industry: &str) -> f64 {
        self.industry_multipliers
            .get(&industry.to_ascii_lowercase())
            .copied()
            .unwrap_or(1.0)
    }

    pub fn channel_base_rate(&self, channel: &str) -> f64 {
        self.channel_base_rates.get(channel).copied().unwrap_or(0.7)
    }
}
