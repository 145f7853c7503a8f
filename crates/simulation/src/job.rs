//! The simulation job record and its state machine.
//!
//! States: `queued → processing → {completed | failed | cancelled}`, with
//! `failed → queued` (retry) as the only back-edge. Queue metadata lives
//! inside the `Queued`/`Processing`/`Failed` variants, so a completed or
//! cancelled job *cannot* carry it; the invariant holds by construction.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use adsim_core::{
    CampaignId, DomainError, DomainResult, OrganizationId, SimulationJobId, SubscriptionTier,
    UserId,
};

use crate::config::SimulationConfig;

/// Queue bookkeeping carried while a job is queued, processing, or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMeta {
    /// Scheduling priority; higher is dequeued first.
    pub priority: i32,
    /// Driver's estimate of how long processing will take.
    pub estimated_duration: Duration,
    pub tier: SubscriptionTier,
    pub queued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Never decreases; bumped only by the retry transition.
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

impl QueueMeta {
    pub fn new(
        priority: i32,
        estimated_duration: Duration,
        tier: SubscriptionTier,
        queued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            priority,
            estimated_duration,
            tier,
            queued_at,
            started_at: None,
            retry_count: 0,
            retry_at: None,
            error: None,
            failed_at: None,
        }
    }

    /// True once the job's retry-at gate (if any) has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.retry_at.is_none_or(|at| at <= now)
    }
}

/// Terminal output of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedRun {
    /// Scored results blob (benchmark + competitive analyses, warnings,
    /// confidence). Opaque to the state machine.
    pub results: JsonValue,
    /// Model name/version/timings reported by the forecasting model.
    pub model_metadata: JsonValue,
    /// Wall-clock processing time, retained for aggregate statistics after
    /// queue metadata is gone.
    pub processing: Duration,
    pub completed_at: DateTime<Utc>,
}

/// Current position of a job in its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Queued(QueueMeta),
    Processing(QueueMeta),
    Failed(QueueMeta),
    Completed(CompletedRun),
    Cancelled,
}

/// Flat status discriminant for queries and snapshots.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued(_) => JobStatus::Queued,
            JobState::Processing(_) => JobStatus::Processing,
            JobState::Completed(_) => JobStatus::Completed,
            JobState::Failed(_) => JobStatus::Failed,
            JobState::Cancelled => JobStatus::Cancelled,
        }
    }

    /// Queue metadata, present iff the job is queued, processing, or failed.
    pub fn queue_meta(&self) -> Option<&QueueMeta> {
        match self {
            JobState::Queued(meta) | JobState::Processing(meta) | JobState::Failed(meta) => {
                Some(meta)
            }
            JobState::Completed(_) | JobState::Cancelled => None,
        }
    }
}

/// Snapshot returned to polling callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub job_id: SimulationJobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueMeta>,
    /// In-flight progress estimate in `[0, 100)`; informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// The unit of work the pipeline schedules and scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationJob {
    pub id: SimulationJobId,
    pub campaign_id: CampaignId,
    pub organization_id: OrganizationId,
    pub requested_by: UserId,
    pub config: SimulationConfig,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SimulationJob {
    /// Create a job in the `queued` state.
    #[allow(clippy::too_many_arguments)]
    pub fn enqueue(
        campaign_id: CampaignId,
        organization_id: OrganizationId,
        requested_by: UserId,
        config: SimulationConfig,
        priority: i32,
        estimated_duration: Duration,
        tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SimulationJobId::new(),
            campaign_id,
            organization_id,
            requested_by,
            config,
            state: JobState::Queued(QueueMeta::new(priority, estimated_duration, tier, now)),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn queue_meta(&self) -> Option<&QueueMeta> {
        self.state.queue_meta()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Completed(_) | JobState::Cancelled)
    }

    /// `queued → processing`; stamps `started_at`, preserves all other
    /// queue metadata.
    pub fn start(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match &self.state {
            JobState::Queued(meta) => {
                let mut meta = meta.clone();
                meta.started_at = Some(now);
                self.state = JobState::Processing(meta);
                self.updated_at = now;
                Ok(())
            }
            other => Err(DomainError::invalid_transition(format!(
                "start from {}",
                other.status()
            ))),
        }
    }

    /// `processing → completed`; queue metadata is dropped with the variant.
    pub fn complete(
        &mut self,
        results: JsonValue,
        model_metadata: JsonValue,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        match &self.state {
            JobState::Processing(meta) => {
                let processing = meta
                    .started_at
                    .and_then(|s| (now - s).to_std().ok())
                    .unwrap_or(Duration::ZERO);
                self.state = JobState::Completed(CompletedRun {
                    results,
                    model_metadata,
                    processing,
                    completed_at: now,
                });
                self.updated_at = now;
                Ok(())
            }
            other => Err(DomainError::invalid_transition(format!(
                "complete from {}",
                other.status()
            ))),
        }
    }

    /// `processing → failed`; records the error. The retry count is *not*
    /// incremented here; that belongs to the retry transition.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> DomainResult<()> {
        match &self.state {
            JobState::Processing(meta) => {
                let mut meta = meta.clone();
                meta.error = Some(error.into());
                meta.failed_at = Some(now);
                self.state = JobState::Failed(meta);
                self.updated_at = now;
                Ok(())
            }
            other => Err(DomainError::invalid_transition(format!(
                "fail from {}",
                other.status()
            ))),
        }
    }

    /// `failed → queued`; the only back-edge.
    ///
    /// The caller supplies the new retry count (expected: previous + 1) and
    /// when the job becomes due again. Backoff timing is the scheduler
    /// driver's concern, not the record's. A count lower than the current
    /// one is rejected, since retry counts never decrease.
    pub fn retry(
        &mut self,
        new_retry_count: u32,
        retry_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        match &self.state {
            JobState::Failed(meta) => {
                if new_retry_count < meta.retry_count {
                    return Err(DomainError::invariant(format!(
                        "retry count may not decrease ({} -> {})",
                        meta.retry_count, new_retry_count
                    )));
                }
                let mut meta = meta.clone();
                meta.retry_count = new_retry_count;
                meta.retry_at = Some(retry_at);
                meta.error = None;
                meta.failed_at = None;
                meta.started_at = None;
                self.state = JobState::Queued(meta);
                self.updated_at = now;
                Ok(())
            }
            other => Err(DomainError::invalid_transition(format!(
                "retry from {}",
                other.status()
            ))),
        }
    }

    /// Cancel from `queued` or `processing`; queue metadata is dropped.
    ///
    /// Cancellation is cooperative: an in-flight worker keeps computing but
    /// must discard its result once it observes this state.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match &self.state {
            JobState::Queued(_) | JobState::Processing(_) => {
                self.state = JobState::Cancelled;
                self.updated_at = now;
                Ok(())
            }
            other => Err(DomainError::invalid_transition(format!(
                "cancel from {}",
                other.status()
            ))),
        }
    }

    /// In-flight progress estimate for polling UIs, capped at 95 until the
    /// terminal transition actually fires. Never reports 100 early.
    pub fn progress(&self, now: DateTime<Utc>) -> Option<f64> {
        match &self.state {
            JobState::Processing(meta) => {
                let started = meta.started_at?;
                let estimate = meta.estimated_duration.as_secs_f64();
                if estimate <= 0.0 {
                    return Some(0.0);
                }
                let elapsed = (now - started).to_std().ok()?.as_secs_f64();
                Some((elapsed / estimate).min(0.95) * 100.0)
            }
            JobState::Completed(_) => Some(100.0),
            _ => None,
        }
    }

    /// Snapshot for polling callers.
    pub fn snapshot(&self, now: DateTime<Utc>) -> StatusSnapshot {
        StatusSnapshot {
            job_id: self.id,
            status: self.status(),
            queue: self.queue_meta().cloned(),
            progress: self.progress(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsim_core::{Granularity, MetricKind, Timeframe};
    use chrono::TimeZone;

    use crate::config::MetricWeight;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn test_config() -> SimulationConfig {
        SimulationConfig {
            timeframe: Timeframe::new(utc(2026, 1, 1), utc(2026, 2, 1), Granularity::Daily),
            metrics: vec![MetricWeight::new(MetricKind::Ctr, 1.0)],
            scenarios: Vec::new(),
            data_sources: Vec::new(),
        }
    }

    fn queued_job(priority: i32, now: DateTime<Utc>) -> SimulationJob {
        SimulationJob::enqueue(
            CampaignId::new(),
            OrganizationId::new(),
            UserId::new(),
            test_config(),
            priority,
            Duration::from_secs(120),
            SubscriptionTier::Professional,
            now,
        )
    }

    #[test]
    fn happy_path_lifecycle() {
        let t0 = utc(2026, 3, 1);
        let mut job = queued_job(5, t0);
        assert_eq!(job.status(), JobStatus::Queued);
        assert!(job.queue_meta().is_some());

        job.start(t0 + chrono::Duration::seconds(1)).unwrap();
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(job.queue_meta().unwrap().started_at.is_some());
        // Priority survives the start transition.
        assert_eq!(job.queue_meta().unwrap().priority, 5);

        job.complete(
            serde_json::json!({"ok": true}),
            JsonValue::Null,
            t0 + chrono::Duration::seconds(90),
        )
        .unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.queue_meta().is_none());
        match &job.state {
            JobState::Completed(run) => {
                assert_eq!(run.processing, Duration::from_secs(89));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn fail_records_error_without_bumping_retry_count() {
        let t0 = utc(2026, 3, 1);
        let mut job = queued_job(5, t0);
        job.start(t0).unwrap();
        job.fail("model timed out", t0).unwrap();

        let meta = job.queue_meta().unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(meta.error.as_deref(), Some("model timed out"));
        assert_eq!(meta.retry_count, 0);
        assert!(meta.failed_at.is_some());
    }

    #[test]
    fn retry_requeues_and_clears_error() {
        let t0 = utc(2026, 3, 1);
        let mut job = queued_job(10, t0);
        job.start(t0).unwrap();
        job.fail("transient storage error", t0).unwrap();

        job.retry(1, t0 + chrono::Duration::seconds(30), t0).unwrap();

        let meta = job.queue_meta().unwrap();
        assert_eq!(job.status(), JobStatus::Queued);
        assert_eq!(meta.retry_count, 1);
        assert!(meta.error.is_none());
        assert!(meta.failed_at.is_none());
        assert!(meta.started_at.is_none());
        assert!(meta.retry_at.is_some());
    }

    #[test]
    fn retry_count_may_not_decrease() {
        let t0 = utc(2026, 3, 1);
        let mut job = queued_job(1, t0);
        job.start(t0).unwrap();
        job.fail("e1", t0).unwrap();
        job.retry(2, t0, t0).unwrap();
        job.start(t0).unwrap();
        job.fail("e2", t0).unwrap();

        assert!(job.retry(1, t0, t0).is_err());
        // Still failed, still carrying the error.
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.queue_meta().unwrap().error.as_deref(), Some("e2"));
    }

    #[test]
    fn cancel_allowed_from_queued_and_processing_only() {
        let t0 = utc(2026, 3, 1);

        let mut queued = queued_job(1, t0);
        queued.cancel(t0).unwrap();
        assert_eq!(queued.status(), JobStatus::Cancelled);
        assert!(queued.queue_meta().is_none());

        let mut processing = queued_job(1, t0);
        processing.start(t0).unwrap();
        processing.cancel(t0).unwrap();
        assert_eq!(processing.status(), JobStatus::Cancelled);

        let mut done = queued_job(1, t0);
        done.start(t0).unwrap();
        done.complete(JsonValue::Null, JsonValue::Null, t0).unwrap();
        assert!(done.cancel(t0).is_err());
    }

    #[test]
    fn completion_requires_processing() {
        let t0 = utc(2026, 3, 1);
        let mut job = queued_job(1, t0);
        // Straight from queued is rejected: completion only ever follows an
        // explicit processing phase.
        assert!(job
            .complete(JsonValue::Null, JsonValue::Null, t0)
            .is_err());
        assert!(job.fail("nope", t0).is_err());
        assert!(job.retry(1, t0, t0).is_err());
    }

    #[test]
    fn progress_is_capped_below_terminal() {
        let t0 = utc(2026, 3, 1);
        let mut job = queued_job(1, t0);
        assert_eq!(job.progress(t0), None);

        job.start(t0).unwrap();
        let halfway = job.progress(t0 + chrono::Duration::seconds(60)).unwrap();
        assert!((halfway - 50.0).abs() < 1e-9);

        // Far past the estimate, still capped at 95.
        let late = job.progress(t0 + chrono::Duration::seconds(100_000)).unwrap();
        assert!((late - 95.0).abs() < 1e-9);

        job.complete(JsonValue::Null, JsonValue::Null, t0 + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(job.progress(t0 + chrono::Duration::seconds(5)), Some(100.0));
    }

    mod transition_fuzz {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Start,
            Complete,
            Fail,
            Retry,
            Cancel,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Start),
                Just(Op::Complete),
                Just(Op::Fail),
                Just(Op::Retry),
                Just(Op::Cancel),
            ]
        }

        proptest! {
            /// Queue metadata is present iff status is queued/processing/failed,
            /// after every step of any transition sequence (valid or rejected).
            #[test]
            fn queue_meta_presence_matches_status(ops in proptest::collection::vec(op_strategy(), 1..40)) {
                let t0 = utc(2026, 3, 1);
                let mut job = queued_job(5, t0);
                let mut retries = job.queue_meta().map_or(0, |m| m.retry_count);

                for op in ops {
                    let _ = match op {
                        Op::Start => job.start(t0),
                        Op::Complete => job.complete(JsonValue::Null, JsonValue::Null, t0),
                        Op::Fail => job.fail("fuzz", t0),
                        Op::Retry => job.retry(retries + 1, t0, t0),
                        Op::Cancel => job.cancel(t0),
                    };

                    let has_meta = job.queue_meta().is_some();
                    match job.status() {
                        JobStatus::Queued | JobStatus::Processing | JobStatus::Failed => {
                            prop_assert!(has_meta)
                        }
                        JobStatus::Completed | JobStatus::Cancelled => {
                            prop_assert!(!has_meta)
                        }
                    }

                    // Retry count never decreases.
                    if let Some(meta) = job.queue_meta() {
                        prop_assert!(meta.retry_count >= retries);
                        retries = meta.retry_count;
                    }
                }
            }
        }
    }
}
