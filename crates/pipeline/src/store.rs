//! Job storage: the durable-store abstraction and the in-memory
//! implementation used by tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use adsim_core::{OrganizationId, SimulationJobId};
use adsim_simulation::{JobStatus, SimulationJob};

/// Job store abstraction over the external persistence collaborator.
pub trait JobStore: Send + Sync {
    /// Insert a freshly enqueued job.
    fn insert(&self, job: SimulationJob) -> Result<SimulationJobId, JobStoreError>;

    /// Fetch a job by id.
    fn get(&self, job_id: SimulationJobId) -> Result<Option<SimulationJob>, JobStoreError>;

    /// Persist the current state of a job.
    fn update(&self, job: &SimulationJob) -> Result<(), JobStoreError>;

    /// Atomically claim the next due queued job and move it to processing.
    ///
    /// This is the only `queued → processing` path; a job is handed to at
    /// most one caller. Candidates are ordered by priority descending, then
    /// `queued_at` ascending (strict FIFO within a priority band). Jobs with
    /// a `retry_at` still in the future are skipped.
    fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<SimulationJob>, JobStoreError>;

    /// List jobs by status, oldest first.
    fn list_by_status(
        &self,
        status: JobStatus,
        limit: usize,
    ) -> Result<Vec<SimulationJob>, JobStoreError>;

    /// List an organization's jobs, oldest first.
    fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        limit: usize,
    ) -> Result<Vec<SimulationJob>, JobStoreError>;

    /// Delete a job outright.
    fn delete(&self, job_id: SimulationJobId) -> Result<(), JobStoreError>;

    /// Job counts by status.
    fn counts(&self) -> Result<JobCounts, JobStoreError>;

    /// Number of queued or processing jobs for one organization.
    fn queue_depth(&self, organization_id: OrganizationId) -> Result<usize, JobStoreError>;

    /// Success rate and average processing time over a trailing window.
    fn window_stats(&self, since: DateTime<Utc>) -> Result<WindowStats, JobStoreError>;

    /// Delete terminal (completed/failed/cancelled) jobs created before the
    /// horizon. Active jobs are never swept regardless of age. Returns the
    /// number of jobs removed.
    fn sweep_terminal(&self, created_before: DateTime<Utc>) -> Result<usize, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(SimulationJobId),
    #[error("job already exists: {0}")]
    AlreadyExists(SimulationJobId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Queue composition by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct JobCounts {
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Aggregate statistics over a trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct WindowStats {
    pub completed: usize,
    pub failed: usize,
    /// `completed / (completed + failed)`; 0 when the window is empty.
    pub success_rate: f64,
    pub average_processing_secs: f64,
}

/// In-memory job store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<SimulationJobId, SimulationJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: SimulationJob) -> Result<SimulationJobId, JobStoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        let id = job.id;
        jobs.insert(id, job);
        Ok(id)
    }

    fn get(&self, job_id: SimulationJobId) -> Result<Option<SimulationJob>, JobStoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        Ok(jobs.get(&job_id).cloned())
    }

    fn update(&self, job: &SimulationJob) -> Result<(), JobStoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        if !jobs.contains_key(&job.id) {
            return Err(JobStoreError::NotFound(job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<SimulationJob>, JobStoreError> {
        // Write lock held across select-and-start, so the transition is
        // atomic: at most one caller observes a given job as queued.
        let mut jobs = self
            .jobs
            .write()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;

        let next = jobs
            .values()
            .filter(|j| j.status() == JobStatus::Queued)
            .filter(|j| j.queue_meta().is_some_and(|m| m.is_due(now)))
            .map(|j| {
                let meta = j.queue_meta().map(|m| (m.priority, m.queued_at));
                (j.id, meta)
            })
            .max_by_key(|(_, meta)| {
                // Highest priority first; within a band, oldest queued_at
                // wins, hence the Reverse on the tie-break.
                meta.map(|(priority, queued_at)| (priority, core::cmp::Reverse(queued_at)))
            })
            .map(|(id, _)| id);

        let Some(id) = next else {
            return Ok(None);
        };
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(None);
        };
        job.start(now)
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        Ok(Some(job.clone()))
    }

    fn list_by_status(
        &self,
        status: JobStatus,
        limit: usize,
    ) -> Result<Vec<SimulationJob>, JobStoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        let mut result: Vec<_> = jobs
            .values()
            .filter(|j| j.status() == status)
            .cloned()
            .collect();
        result.sort_by_key(|j| j.created_at);
        result.truncate(limit);
        Ok(result)
    }

    fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        limit: usize,
    ) -> Result<Vec<SimulationJob>, JobStoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        let mut result: Vec<_> = jobs
            .values()
            .filter(|j| j.organization_id == organization_id)
            .cloned()
            .collect();
        result.sort_by_key(|j| j.created_at);
        result.truncate(limit);
        Ok(result)
    }

    fn delete(&self, job_id: SimulationJobId) -> Result<(), JobStoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        jobs.remove(&job_id)
            .map(|_| ())
            .ok_or(JobStoreError::NotFound(job_id))
    }

    fn counts(&self) -> Result<JobCounts, JobStoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        let mut counts = JobCounts::default();
        for job in jobs.values() {
            match job.status() {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Cancelled => counts.cancelled += 1,
            }
        }
        Ok(counts)
    }

    fn queue_depth(&self, organization_id: OrganizationId) -> Result<usize, JobStoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        Ok(jobs
            .values()
            .filter(|j| {
                j.organization_id == organization_id
                    && matches!(j.status(), JobStatus::Queued | JobStatus::Processing)
            })
            .count())
    }

    fn window_stats(&self, since: DateTime<Utc>) -> Result<WindowStats, JobStoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;

        let mut stats = WindowStats::default();
        let mut processing_total = 0.0;

        for job in jobs.values() {
            match &job.state {
                adsim_simulation::JobState::Completed(run) if run.completed_at >= since => {
                    stats.completed += 1;
                    processing_total += run.processing.as_secs_f64();
                }
                adsim_simulation::JobState::Failed(meta)
                    if meta.failed_at.is_some_and(|at| at >= since) =>
                {
                    stats.failed += 1;
                }
                _ => {}
            }
        }

        let finished = stats.completed + stats.failed;
        if finished > 0 {
            stats.success_rate = stats.completed as f64 / finished as f64;
        }
        if stats.completed > 0 {
            stats.average_processing_secs = processing_total / stats.completed as f64;
        }
        Ok(stats)
    }

    fn sweep_terminal(&self, created_before: DateTime<Utc>) -> Result<usize, JobStoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        let before = jobs.len();
        jobs.retain(|_, j| {
            let sweepable = matches!(
                j.status(),
                JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
            );
            !(sweepable && j.created_at < created_before)
        });
        Ok(before - jobs.len())
    }
}

impl<S: JobStore + ?Sized> JobStore for Arc<S> {
    fn insert(&self, job: SimulationJob) -> Result<SimulationJobId, JobStoreError> {
        (**self).insert(job)
    }

    fn get(&self, job_id: SimulationJobId) -> Result<Option<SimulationJob>, JobStoreError> {
        (**self).get(job_id)
    }

    fn update(&self, job: &SimulationJob) -> Result<(), JobStoreError> {
        (**self).update(job)
    }

    fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<SimulationJob>, JobStoreError> {
        (**self).claim_next(now)
    }

    fn list_by_status(
        &self,
        status: JobStatus,
        limit: usize,
    ) -> Result<Vec<SimulationJob>, JobStoreError> {
        (**self).list_by_status(status, limit)
    }

    fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        limit: usize,
    ) -> Result<Vec<SimulationJob>, JobStoreError> {
        (**self).list_by_organization(organization_id, limit)
    }

    fn delete(&self, job_id: SimulationJobId) -> Result<(), JobStoreError> {
        (**self).delete(job_id)
    }

    fn counts(&self) -> Result<JobCounts, JobStoreError> {
        (**self).counts()
    }

    fn queue_depth(&self, organization_id: OrganizationId) -> Result<usize, JobStoreError> {
        (**self).queue_depth(organization_id)
    }

    fn window_stats(&self, since: DateTime<Utc>) -> Result<WindowStats, JobStoreError> {
        (**self).window_stats(since)
    }

    fn sweep_terminal(&self, created_before: DateTime<Utc>) -> Result<usize, JobStoreError> {
        (**self).sweep_terminal(created_before)
    }
}
