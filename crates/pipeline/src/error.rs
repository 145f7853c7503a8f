//! Pipeline error taxonomy.

use adsim_core::DomainError;
use adsim_simulation::ValidationReport;

use crate::store::JobStoreError;

/// Errors a simulation can surface to callers or the scheduler driver.
///
/// Validation errors are returned synchronously at submission and never
/// enter the queue. Transient and model errors are retryable; the driver
/// decides when to give up. Cancellation is a cooperative exit, not a
/// fault. Data-quality problems are deliberately absent here: they ride on
/// the result as a confidence discount and never fail a job.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("request failed validation with {} error(s)", .0.errors.len())]
    Validation(ValidationReport),

    /// Network/storage failure while fetching datasets or persisting state.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The pluggable forecasting model is unavailable or refused the input.
    #[error("model failure: {0}")]
    Model(String),

    /// The job was cancelled while the worker was computing.
    #[error("job cancelled during processing")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] JobStoreError),

    /// A state-machine transition the job's current state does not allow
    /// (e.g. cancelling a completed job).
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl PipelineError {
    /// Whether the scheduler driver should consider another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Transient(_) | PipelineError::Model(_))
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        PipelineError::Transient(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        PipelineError::Model(msg.into())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
