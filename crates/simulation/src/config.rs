//! Simulation request and configuration types.

use serde::{Deserialize, Serialize};

use adsim_core::{CampaignId, MetricKind, OrganizationId, Timeframe, UserId};

/// A metric the caller wants forecast, with its weight in the overall score.
///
/// Weights are expected to be in `[0, 1]` and to sum to 1.0 across the
/// request; both are checked by [`crate::validate::validate_request`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeight {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub weight: f64,
}

impl MetricWeight {
    pub fn new(kind: MetricKind, weight: f64) -> Self {
        Self { kind, weight }
    }
}

/// Scenario family for a forecast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Optimistic,
    Realistic,
    Pessimistic,
    Custom,
}

/// One scenario to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(rename = "type")]
    pub kind: ScenarioKind,
    /// Target percentile for custom scenarios; must be in `[0, 100]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Scenario {
    pub fn of(kind: ScenarioKind) -> Self {
        Self {
            kind,
            percentile: None,
            label: None,
        }
    }

    pub fn custom(percentile: f64) -> Self {
        Self {
            kind: ScenarioKind::Custom,
            percentile: Some(percentile),
            label: None,
        }
    }
}

/// External dataset a simulation may enrich itself from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    IndustryBenchmarks,
    CompetitorActivity,
    MarketTrends,
    PlatformImport,
}

/// Validated configuration a job carries through its whole lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub timeframe: Timeframe,
    pub metrics: Vec<MetricWeight>,
    pub scenarios: Vec<Scenario>,
    pub data_sources: Vec<DataSource>,
}

/// Raw submission as it arrives from a collaborator (UI/API boundary).
///
/// Required fields are `Option` here precisely so the validation layer can
/// report `REQUIRED_FIELD_MISSING` instead of the boundary rejecting the
/// payload with a deserialization error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub campaign_id: Option<CampaignId>,
    pub organization_id: OrganizationId,
    pub requested_by: UserId,
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub metrics: Vec<MetricWeight>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
}

impl SimulationRequest {
    /// Build the job config from a request that passed validation.
    ///
    /// Panics are avoided: missing required fields yield `None`, which the
    /// service treats as a validation bug rather than unwrapping.
    pub fn into_config(self) -> Option<(CampaignId, SimulationConfig)> {
        let campaign_id = self.campaign_id?;
        let timeframe = self.timeframe?;
        Some((
            campaign_id,
            SimulationConfig {
                timeframe,
                metrics: self.metrics,
                scenarios: self.scenarios,
                data_sources: self.data_sources,
            },
        ))
    }
}
