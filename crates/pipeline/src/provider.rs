//! Collaborator seams: dataset providers and the pluggable forecast model.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use adsim_analytics::{CalibrationTable, CampaignDataset, MarketDataset};
use adsim_core::{CampaignId, MetricKind};
use adsim_simulation::{Scenario, ScenarioKind, SimulationConfig};

use crate::error::{PipelineError, PipelineResult};

/// Read-only access to campaign and market data held by external
/// collaborators. Failures here are infrastructure failures, hence the
/// `anyhow` boundary; the worker maps them to transient job errors.
pub trait DatasetProvider: Send + Sync {
    fn campaign_dataset(&self, campaign_id: CampaignId) -> anyhow::Result<CampaignDataset>;

    fn market_dataset(&self, industry: &str, region: &str) -> anyhow::Result<MarketDataset>;
}

/// Per-scenario projected metric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub scenario: ScenarioKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub projections: BTreeMap<MetricKind, f64>,
}

/// What a forecasting model reports about itself alongside its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    pub version: String,
    pub elapsed_ms: u64,
}

/// Full output of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub scenarios: Vec<ScenarioProjection>,
    pub metadata: ModelMetadata,
}

/// Pluggable forecasting model.
///
/// A failure is a `ModelError`: retryable by the driver up to its cap, then
/// terminal.
pub trait ForecastModel: Send + Sync {
    fn forecast(
        &self,
        dataset: &CampaignDataset,
        config: &SimulationConfig,
    ) -> PipelineResult<ModelOutput>;
}

/// Built-in heuristic model: historical means scaled by calibration
/// multipliers and a per-scenario factor. Not numerically calibrated;
/// deployments plug in a real model behind [`ForecastModel`].
pub struct HeuristicModel {
    calibration: CalibrationTable,
}

impl HeuristicModel {
    pub fn new(calibration: CalibrationTable) -> Self {
        Self { calibration }
    }

    fn scenario_factor(scenario: &Scenario) -> f64 {
        match scenario.kind {
            ScenarioKind::Optimistic => 1.15,
            ScenarioKind::Realistic => 1.0,
            ScenarioKind::Pessimistic => 0.85,
            // Map the target percentile onto [0.7, 1.3], with p50 = 1.0.
            ScenarioKind::Custom => {
                let p = scenario.percentile.unwrap_or(50.0).clamp(0.0, 100.0);
                0.7 + 0.6 * (p / 100.0)
            }
        }
    }
}

impl Default for HeuristicModel {
    fn default() -> Self {
        Self::new(CalibrationTable::default())
    }
}

impl ForecastModel for HeuristicModel {
    fn forecast(
        &self,
        dataset: &CampaignDataset,
        config: &SimulationConfig,
    ) -> PipelineResult<ModelOutput> {
        let started = std::time::Instant::now();

        let industry = self
            .calibration
            .industry_multiplier(&dataset.campaign.industry);
        let channels = &dataset.campaign.channels;
        let channel_rate = if channels.is_empty() {
            1.0
        } else {
            channels
                .iter()
                .map(|c| self.calibration.channel_base_rate(c.name()))
                .sum::<f64>()
                / channels.len() as f64
        };

        let realistic = [Scenario::of(ScenarioKind::Realistic)];
        let scenarios: &[Scenario] = if config.scenarios.is_empty() {
            &realistic
        } else {
            &config.scenarios
        };

        let mut out = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let factor = Self::scenario_factor(scenario);
            let mut projections = BTreeMap::new();
            for weight in &config.metrics {
                if let Some(mean) = dataset.mean_metric(weight.kind) {
                    projections.insert(weight.kind, mean * industry * channel_rate * factor);
                }
            }
            out.push(ScenarioProjection {
                scenario: scenario.kind,
                label: scenario.label.clone(),
                projections,
            });
        }

        Ok(ModelOutput {
            scenarios: out,
            metadata: ModelMetadata {
                name: "heuristic".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        })
    }
}

/// A model stub that always fails, for exercising the failure path.
pub struct FailingModel {
    pub message: String,
}

impl ForecastModel for FailingModel {
    fn forecast(
        &self,
        _dataset: &CampaignDataset,
        _config: &SimulationConfig,
    ) -> PipelineResult<ModelOutput> {
        Err(PipelineError::model(self.message.clone()))
    }
}

/// In-memory dataset provider for tests/dev.
#[derive(Default)]
pub struct InMemoryDatasetProvider {
    campaigns: RwLock<HashMap<CampaignId, CampaignDataset>>,
    markets: RwLock<HashMap<String, MarketDataset>>,
}

impl InMemoryDatasetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_campaign(&self, dataset: CampaignDataset) {
        if let Ok(mut campaigns) = self.campaigns.write() {
            campaigns.insert(dataset.campaign.campaign_id, dataset);
        }
    }

    pub fn put_market(&self, industry: &str, region: &str, dataset: MarketDataset) {
        if let Ok(mut markets) = self.markets.write() {
            markets.insert(market_key(industry, region), dataset);
        }
    }
}

pub(crate) fn market_key(industry: &str, region: &str) -> String {
    format!(
        "{}|{}",
        industry.to_ascii_lowercase(),
        region.to_ascii_lowercase()
    )
}

impl DatasetProvider for InMemoryDatasetProvider {
    fn campaign_dataset(&self, campaign_id: CampaignId) -> anyhow::Result<CampaignDataset> {
        let campaigns = self
            .campaigns
            .read()
            .map_err(|e| anyhow::anyhow!("campaign store poisoned: {e}"))?;
        campaigns
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("campaign not found: {campaign_id}"))
    }

    fn market_dataset(&self, industry: &str, region: &str) -> anyhow::Result<MarketDataset> {
        let markets = self
            .markets
            .read()
            .map_err(|e| anyhow::anyhow!("market store poisoned: {e}"))?;
        Ok(markets
            .get(&market_key(industry, region))
            .cloned()
            .unwrap_or(MarketDataset {
                activity: Vec::new(),
                benchmarks: Default::default(),
                fetched_at: Utc::now(),
            }))
    }
}

/// An always-failing provider, for exercising the transient failure path.
pub struct UnavailableProvider;

impl DatasetProvider for UnavailableProvider {
    fn campaign_dataset(&self, _campaign_id: CampaignId) -> anyhow::Result<CampaignDataset> {
        anyhow::bail!("dataset service unreachable")
    }

    fn market_dataset(&self, _industry: &str, _region: &str) -> anyhow::Result<MarketDataset> {
        anyhow::bail!("dataset service unreachable")
    }
}
