//! The `SimulationService` facade exposed to collaborators (UI/API).

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use adsim_core::{OrganizationId, SimulationJobId, SubscriptionTier};
use adsim_simulation::{
    validate_request, CompletedRun, JobState, SimulationConfig, SimulationJob, SimulationRequest,
    StatusSnapshot,
};

use crate::error::{PipelineError, PipelineResult};
use crate::store::{JobCounts, JobStore, WindowStats};

/// How a processing-time estimate is derived from a request.
#[derive(Debug, Clone)]
pub struct EstimateConfig {
    pub base: Duration,
    pub per_day: Duration,
    pub per_metric: Duration,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(20),
            per_day: Duration::from_secs(1),
            per_metric: Duration::from_secs(5),
        }
    }
}

impl EstimateConfig {
    /// Estimated processing time: scales with timeframe length and metric
    /// count. Informational only; drives progress estimates and the stuck
    /// threshold.
    pub fn estimate(&self, config: &SimulationConfig) -> Duration {
        let days = config.timeframe.duration_days().max(0) as u32;
        self.base
            + self.per_day * days
            + self.per_metric * config.metrics.len() as u32
    }
}

/// Submission, polling, and introspection facade over the job store.
///
/// Workers run independently; the service never computes results itself.
pub struct SimulationService<S: JobStore> {
    store: S,
    estimates: EstimateConfig,
}

impl<S: JobStore> SimulationService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            estimates: EstimateConfig::default(),
        }
    }

    pub fn with_estimates(mut self, estimates: EstimateConfig) -> Self {
        self.estimates = estimates;
        self
    }

    /// Validate and enqueue a simulation request.
    ///
    /// Validation errors are returned synchronously; an invalid request is
    /// never enqueued. Priority derives from the subscription tier unless
    /// the caller overrides it.
    pub fn submit(
        &self,
        request: SimulationRequest,
        tier: SubscriptionTier,
        priority_override: Option<i32>,
        now: DateTime<Utc>,
    ) -> PipelineResult<SimulationJobId> {
        let report = validate_request(&request, now);
        if !report.valid {
            debug!(
                organization_id = %request.organization_id,
                errors = report.errors.len(),
                "submission rejected by validation"
            );
            return Err(PipelineError::Validation(report));
        }

        let organization_id = request.organization_id;
        let requested_by = request.requested_by;
        let Some((campaign_id, config)) = request.into_config() else {
            // A valid report guarantees required fields; reaching this is a
            // validation bug, not a caller error.
            return Err(PipelineError::transient(
                "validated request is missing required fields",
            ));
        };

        let priority = priority_override.unwrap_or_else(|| tier.default_priority());
        let estimate = self.estimates.estimate(&config);

        let job = SimulationJob::enqueue(
            campaign_id,
            organization_id,
            requested_by,
            config,
            priority,
            estimate,
            tier,
            now,
        );
        let id = self.store.insert(job)?;
        info!(
            job_id = %id,
            campaign_id = %campaign_id,
            organization_id = %organization_id,
            priority,
            estimate_secs = estimate.as_secs(),
            "simulation job enqueued"
        );
        Ok(id)
    }

    /// Status + queue metadata snapshot for polling UIs.
    pub fn status(
        &self,
        job_id: SimulationJobId,
        now: DateTime<Utc>,
    ) -> PipelineResult<StatusSnapshot> {
        let job = self.fetch(job_id)?;
        Ok(job.snapshot(now))
    }

    /// Cancel a queued or processing job. Cooperative: an in-flight worker
    /// discards its result once it observes the cancelled state.
    pub fn cancel(&self, job_id: SimulationJobId, now: DateTime<Utc>) -> PipelineResult<()> {
        let mut job = self.fetch(job_id)?;
        job.cancel(now)?;
        self.store.update(&job)?;
        info!(job_id = %job_id, "job cancelled");
        Ok(())
    }

    /// Explicit caller-driven retry of a failed job.
    pub fn retry(
        &self,
        job_id: SimulationJobId,
        new_retry_count: u32,
        retry_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> PipelineResult<()> {
        let mut job = self.fetch(job_id)?;
        job.retry(new_retry_count, retry_at, now)?;
        self.store.update(&job)?;
        info!(job_id = %job_id, retry_count = new_retry_count, "job requeued by caller");
        Ok(())
    }

    /// The completed result, or `None` while the job is anywhere else in its
    /// lifecycle.
    pub fn result(&self, job_id: SimulationJobId) -> PipelineResult<Option<CompletedRun>> {
        let job = self.fetch(job_id)?;
        match job.state {
            JobState::Completed(run) => Ok(Some(run)),
            _ => Ok(None),
        }
    }

    pub fn counts(&self) -> PipelineResult<JobCounts> {
        Ok(self.store.counts()?)
    }

    pub fn queue_depth(&self, organization_id: OrganizationId) -> PipelineResult<usize> {
        Ok(self.store.queue_depth(organization_id)?)
    }

    pub fn window_stats(&self, since: DateTime<Utc>) -> PipelineResult<WindowStats> {
        Ok(self.store.window_stats(since)?)
    }

    /// Retention sweep: delete terminal jobs created before the horizon.
    pub fn sweep(&self, created_before: DateTime<Utc>) -> PipelineResult<usize> {
        let swept = self.store.sweep_terminal(created_before)?;
        if swept > 0 {
            info!(swept, "retention sweep removed terminal jobs");
        }
        Ok(swept)
    }

    fn fetch(&self, job_id: SimulationJobId) -> PipelineResult<SimulationJob> {
        Ok(self
            .store
            .get(job_id)?
            .ok_or(crate::store::JobStoreError::NotFound(job_id))?)
    }
}
