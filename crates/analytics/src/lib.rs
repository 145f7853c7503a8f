//! `adsim-analytics`
//!
//! **Responsibility:** deterministic scoring of a campaign against reference
//! data: the benchmark scorer and the competitive positioning analyzer.
//!
//! This crate is intentionally **pure**:
//! - no storage, no clocks of its own (reference instants are passed in),
//! - no mutation of inputs (analyzers read datasets and emit analyses),
//! - heuristic constants live in a data-driven [`calibration::CalibrationTable`],
//!   not inline, so they can be recalibrated without code changes.

pub mod benchmark;
pub mod calibration;
pub mod competitors;
pub mod dataset;
pub mod types;

pub use benchmark::{analyze_benchmarks, BenchmarkAnalysis, BenchmarkComparison};
pub use calibration::CalibrationTable;
pub use competitors::{analyze_competitors, CompetitiveAnalysis, CompetitorProfile};
pub use dataset::{
    BenchmarkPoints, BenchmarkTable, CampaignDataset, CampaignSnapshot, CompetitorActivity,
    DatasetQuality, MarketDataset, MetricObservation,
};
pub use types::{Impact, Insight, InsightKind, Performance, Recommendation, Significance};
