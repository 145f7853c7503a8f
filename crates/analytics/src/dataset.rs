//! Read-only input snapshots the analyzers run on.
//!
//! Datasets are fetched by the pipeline from collaborators and treated as
//! point-in-time snapshots; the analyzers never mutate them.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsim_core::{CampaignId, Channel, MetricKind};

/// The campaign record as read from the campaign collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub campaign_id: CampaignId,
    pub name: String,
    pub budget: f64,
    pub currency: String,
    pub channels: Vec<Channel>,
    pub industry: String,
    pub region: String,
}

/// One historical metric reading for the subject campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
    pub metric: MetricKind,
    pub channel: Channel,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

/// Enriched campaign dataset: the campaign plus its performance history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDataset {
    pub campaign: CampaignSnapshot,
    pub history: Vec<MetricObservation>,
    pub fetched_at: DateTime<Utc>,
}

impl CampaignDataset {
    /// Arithmetic mean of all historical observations of a metric, across
    /// all channels. `None` when the metric was never observed.
    pub fn mean_metric(&self, metric: MetricKind) -> Option<f64> {
        let values: Vec<f64> = self
            .history
            .iter()
            .filter(|o| o.metric == metric && o.value.is_finite())
            .map(|o| o.value)
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Metrics that have at least one usable observation.
    pub fn observed_metrics(&self) -> BTreeSet<MetricKind> {
        self.history
            .iter()
            .filter(|o| o.value.is_finite())
            .map(|o| o.metric)
            .collect()
    }

    /// Score the dataset's fitness for modeling.
    ///
    /// Each component is in `[0, 1]`; the overall score is their average.
    /// Low quality never blocks a job; it discounts result confidence.
    pub fn quality(&self, requested: &[MetricKind], now: DateTime<Utc>) -> DatasetQuality {
        let observed = self.observed_metrics();

        let completeness = if requested.is_empty() {
            1.0
        } else {
            let covered = requested.iter().filter(|m| observed.contains(m)).count();
            covered as f64 / requested.len() as f64
        };

        // Freshness: full credit inside a week, linear decay to zero at 90 days.
        let freshness = match self.history.iter().map(|o| o.observed_at).max() {
            None => 0.0,
            Some(newest) => {
                let age_days = (now - newest).num_days().max(0) as f64;
                if age_days <= 7.0 {
                    1.0
                } else {
                    (1.0 - (age_days - 7.0) / 83.0).clamp(0.0, 1.0)
                }
            }
        };

        let accuracy = if self.history.is_empty() {
            0.0
        } else {
            let usable = self
                .history
                .iter()
                .filter(|o| o.value.is_finite() && o.value >= 0.0)
                .count();
            usable as f64 / self.history.len() as f64
        };

        // Consistency: penalize high per-metric dispersion (coefficient of
        // variation), averaged over metrics with enough data to judge.
        let mut cv_scores = Vec::new();
        for metric in &observed {
            let values: Vec<f64> = self
                .history
                .iter()
                .filter(|o| o.metric == *metric && o.value.is_finite())
                .map(|o| o.value)
                .collect();
            if values.len() < 2 {
                continue;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            if mean.abs() <= f64::EPSILON {
                continue;
            }
            let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
                / (values.len() - 1) as f64;
            let cv = var.sqrt() / mean.abs();
            cv_scores.push((1.0 - cv / 2.0).clamp(0.0, 1.0));
        }
        let consistency = if cv_scores.is_empty() {
            if self.history.is_empty() { 0.0 } else { 1.0 }
        } else {
            cv_scores.iter().sum::<f64>() / cv_scores.len() as f64
        };

        DatasetQuality {
            completeness,
            freshness,
            accuracy,
            consistency,
        }
    }
}

/// Component scores of a dataset's fitness for modeling, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuality {
    pub completeness: f64,
    pub freshness: f64,
    pub accuracy: f64,
    pub consistency: f64,
}

impl DatasetQuality {
    /// Average of the four components.
    pub fn overall(&self) -> f64 {
        (self.completeness + self.freshness + self.accuracy + self.consistency) / 4.0
    }

    /// Quality for an absent dataset (all zeros).
    pub fn missing() -> Self {
        Self {
            completeness: 0.0,
            freshness: 0.0,
            accuracy: 0.0,
            consistency: 0.0,
        }
    }
}

/// Three-point reference distribution for one metric, with the sample size
/// behind it (used when combining channels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPoints {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub sample_size: u32,
}

/// Reference distributions keyed by industry, channel, and region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkTable {
    distributions: HashMap<String, HashMap<MetricKind, BenchmarkPoints>>,
}

impl BenchmarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(industry: &str, channel: &Channel, region: &str) -> String {
        format!(
            "{}|{}|{}",
            industry.to_ascii_lowercase(),
            channel.name(),
            region.to_ascii_lowercase()
        )
    }

    pub fn insert(
        &mut self,
        industry: &str,
        channel: Channel,
        region: &str,
        metric: MetricKind,
        points: BenchmarkPoints,
    ) {
        self.distributions
            .entry(Self::key(industry, &channel, region))
            .or_default()
            .insert(metric, points);
    }

    pub fn lookup(
        &self,
        industry: &str,
        channel: &Channel,
        region: &str,
        metric: MetricKind,
    ) -> Option<BenchmarkPoints> {
        self.distributions
            .get(&Self::key(industry, channel, region))
            .and_then(|m| m.get(&metric))
            .copied()
    }

    /// Combine per-channel distributions into one, weighting each channel by
    /// its sample size. `None` when no channel has a distribution.
    pub fn combined(
        &self,
        industry: &str,
        channels: &[Channel],
        region: &str,
        metric: MetricKind,
    ) -> Option<BenchmarkPoints> {
        let points: Vec<BenchmarkPoints> = channels
            .iter()
            .filter_map(|c| self.lookup(industry, c, region, metric))
            .filter(|p| p.sample_size > 0)
            .collect();
        if points.is_empty() {
            return None;
        }

        let total: f64 = points.iter().map(|p| p.sample_size as f64).sum();
        let weighted = |f: fn(&BenchmarkPoints) -> f64| {
            points
                .iter()
                .map(|p| f(p) * p.sample_size as f64)
                .sum::<f64>()
                / total
        };

        Some(BenchmarkPoints {
            p25: weighted(|p| p.p25),
            p50: weighted(|p| p.p50),
            p75: weighted(|p| p.p75),
            sample_size: points.iter().map(|p| p.sample_size).sum(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }
}

/// One observed action by a named competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorActivity {
    pub competitor: String,
    pub metric: MetricKind,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
    /// Platform/source the observation came from (drives channel attribution).
    pub source: String,
}

/// External market snapshot: competitor activity plus benchmark tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataset {
    pub activity: Vec<CompetitorActivity>,
    pub benchmarks: BenchmarkTable,
    pub fetched_at: DateTime<Utc>,
}

impl MarketDataset {
    /// Quality of the competitor-activity side of the snapshot.
    pub fn quality(&self, now: DateTime<Utc>) -> DatasetQuality {
        if self.activity.is_empty() {
            return DatasetQuality::missing();
        }

        let competitors: BTreeSet<&str> =
            self.activity.iter().map(|a| a.competitor.as_str()).collect();
        // A handful of tracked rivals is enough for positioning.
        let completeness = (competitors.len() as f64 / 5.0).min(1.0);

        let freshness = match self.activity.iter().map(|a| a.observed_at).max() {
            None => 0.0,
            Some(newest) => {
                let age_days = (now - newest).num_days().max(0) as f64;
                if age_days <= 7.0 {
                    1.0
                } else {
                    (1.0 - (age_days - 7.0) / 83.0).clamp(0.0, 1.0)
                }
            }
        };

        let usable = self
            .activity
            .iter()
            .filter(|a| a.value.is_finite() && a.value >= 0.0)
            .count();
        let accuracy = usable as f64 / self.activity.len() as f64;

        let sources: BTreeSet<&str> = self.activity.iter().map(|a| a.source.as_str()).collect();
        let consistency = (sources.len() as f64 / 3.0).min(1.0);

        DatasetQuality {
            completeness,
            freshness,
            accuracy,
            consistency,
        }
    }
}

/// Map an observation source to the channel it implies.
pub fn channel_for_source(source: &str) -> Channel {
    match source.to_ascii_lowercase().as_str() {
        "google_ads" | "bing_ads" | "search" => Channel::Search,
        "meta" | "meta_ads" | "tiktok" | "linkedin" | "social" => Channel::Social,
        "display" | "programmatic" => Channel::Display,
        "youtube" | "video" => Channel::Video,
        "email" | "newsletter" => Channel::Email,
        other => Channel::Other(other.to_string()),
    }
}
