//! `adsim-simulation`: the simulation job record and its state machine.
//!
//! **Responsibility:** pure domain model of a simulation job:
//! - the request/config types callers submit,
//! - the tagged `JobState` machine (queue metadata exists iff the job is
//!   queued, processing, or failed, by construction rather than convention),
//! - submission-time request validation.
//!
//! Storage, scheduling, and scoring live in `adsim-pipeline` and
//! `adsim-analytics`.

pub mod config;
pub mod job;
pub mod validate;

pub use config::{
    DataSource, MetricWeight, Scenario, ScenarioKind, SimulationConfig, SimulationRequest,
};
pub use job::{CompletedRun, JobState, JobStatus, QueueMeta, SimulationJob, StatusSnapshot};
pub use validate::{codes, validate_request, ValidationIssue, ValidationReport};
