//! `adsim-pipeline`: scheduling and execution of simulation jobs.
//!
//! **Responsibility:** everything between a validated request and a
//! completed result:
//! - the [`store::JobStore`] abstraction with its atomic claim, plus the
//!   in-memory implementation for tests/dev,
//! - the polling [`worker::Worker`] that fetches datasets, runs the
//!   analyzers and the pluggable forecast model, and commits results,
//! - retry/backoff policy (the job record itself stays backoff-agnostic),
//! - the result and reference-data TTL caches,
//! - the [`service::SimulationService`] facade collaborators call.

pub mod cache;
pub mod error;
pub mod provider;
pub mod retry;
pub mod service;
pub mod store;
pub mod worker;

pub use cache::{result_fingerprint, ReferenceCache, ResultCache};
pub use error::{PipelineError, PipelineResult};
pub use provider::{
    DatasetProvider, ForecastModel, HeuristicModel, InMemoryDatasetProvider, ModelMetadata,
    ModelOutput, ScenarioProjection,
};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use service::{EstimateConfig, SimulationService};
pub use store::{InMemoryJobStore, JobCounts, JobStore, JobStoreError, WindowStats};
pub use worker::{RunOutcome, Worker, WorkerConfig, WorkerHandle, WorkerStats};
