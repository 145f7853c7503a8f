//! The polling worker: claims jobs, fetches datasets, runs the analyzers
//! and the forecast model, and commits results.
//!
//! Workers are independent; the only coordination between them is the
//! store's atomic claim. Cancellation is cooperative: the worker re-checks
//! the job's state before committing and discards results for a job found
//! cancelled.

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use adsim_analytics::{analyze_benchmarks, analyze_competitors, CalibrationTable, MarketDataset};
use adsim_core::{MetricKind, SimulationJobId};
use adsim_simulation::{JobStatus, SimulationJob};

use crate::cache::{result_fingerprint, ReferenceCache, ResultCache};
use crate::error::{PipelineError, PipelineResult};
use crate::provider::{market_key, DatasetProvider, ForecastModel};
use crate::retry::RetryPolicy;
use crate::store::JobStore;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to poll for claimable jobs.
    pub poll_interval: Duration,
    /// Backoff policy applied to retryable failures.
    pub retry_policy: RetryPolicy,
    /// TTL of cached simulation results.
    pub result_ttl: Duration,
    /// Processing longer than `stuck_factor × estimated_duration` is treated
    /// as stuck and failed with a timeout error.
    pub stuck_factor: f64,
    /// Name for logging.
    pub name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            retry_policy: RetryPolicy::default(),
            result_ttl: Duration::from_secs(60 * 60),
            stuck_factor: 3.0,
            name: "simulation-worker".to_string(),
        }
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing claimable.
    Idle,
    Completed(SimulationJobId),
    /// Completed by serving a cached result.
    CompletedFromCache(SimulationJobId),
    /// Failure recorded; the job may have been requeued for retry.
    Failed(SimulationJobId),
    /// The job was cancelled while processing; results were discarded.
    Cancelled(SimulationJobId),
}

/// Worker runtime counters.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct WorkerStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_retried: u64,
    pub jobs_cancelled: u64,
    pub cache_hits: u64,
    pub uptime_secs: u64,
}

/// Handle to control a spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the loop to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// A simulation worker bound to a store, a dataset provider, and a model.
pub struct Worker<S: JobStore> {
    store: S,
    provider: Arc<dyn DatasetProvider>,
    model: Arc<dyn ForecastModel>,
    calibration: CalibrationTable,
    result_cache: Arc<ResultCache>,
    market_cache: Arc<ReferenceCache<MarketDataset>>,
    config: WorkerConfig,
}

impl<S: JobStore + 'static> Worker<S> {
    pub fn new(
        store: S,
        provider: Arc<dyn DatasetProvider>,
        model: Arc<dyn ForecastModel>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            provider,
            model,
            calibration: CalibrationTable::default(),
            result_cache: Arc::new(ResultCache::new()),
            market_cache: Arc::new(ReferenceCache::default()),
            config,
        }
    }

    pub fn with_calibration(mut self, calibration: CalibrationTable) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_result_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.result_cache = cache;
        self
    }

    pub fn with_market_cache(mut self, cache: Arc<ReferenceCache<MarketDataset>>) -> Self {
        self.market_cache = cache;
        self
    }

    /// Claim and execute at most one job.
    pub fn run_once(&self, now: DateTime<Utc>) -> PipelineResult<RunOutcome> {
        let Some(job) = self.store.claim_next(now)? else {
            return Ok(RunOutcome::Idle);
        };
        let job_id = job.id;
        debug!(job_id = %job_id, campaign_id = %job.campaign_id, "claimed job");

        let result = self
            .execute(&job, now)
            .and_then(|run| self.commit(job_id, run));
        match result {
            Ok(outcome) => {
                info!(job_id = %job_id, outcome = ?outcome, "job finished");
                Ok(outcome)
            }
            Err(PipelineError::Cancelled) => {
                warn!(job_id = %job_id, "job cancelled mid-flight, result discarded");
                Ok(RunOutcome::Cancelled(job_id))
            }
            Err(e) => {
                self.record_failure(job_id, &e, Utc::now())?;
                Ok(RunOutcome::Failed(job_id))
            }
        }
    }

    /// Compute the full result for a claimed job.
    fn execute(&self, job: &SimulationJob, now: DateTime<Utc>) -> PipelineResult<ExecutedRun> {
        let requested: Vec<MetricKind> = job.config.metrics.iter().map(|w| w.kind).collect();
        let fingerprint = result_fingerprint(job.campaign_id, &job.config.timeframe, &requested);

        if let Some(cached) = self.result_cache.get_at(&fingerprint, now) {
            debug!(job_id = %job.id, "result cache hit");
            return Ok(ExecutedRun {
                fingerprint,
                results: cached,
                model_metadata: serde_json::json!({"cache_hit": true}),
                from_cache: true,
            });
        }

        let dataset = self
            .provider
            .campaign_dataset(job.campaign_id)
            .map_err(|e| PipelineError::transient(format!("campaign dataset: {e}")))?;

        let industry = dataset.campaign.industry.clone();
        let region = dataset.campaign.region.clone();
        let market = self
            .market_cache
            .get_or_fetch_at(&market_key(&industry, &region), now, || {
                self.provider
                    .market_dataset(&industry, &region)
                    .map_err(|e| PipelineError::transient(format!("market dataset: {e}")))
            })?;

        let quality = dataset.quality(&requested, now);
        let benchmark = analyze_benchmarks(
            &dataset,
            &market.benchmarks,
            &industry,
            &region,
            &requested,
            quality,
        );
        let competitive = analyze_competitors(&dataset, &market, &self.calibration, now);
        let forecast = self.model.forecast(&dataset, &job.config)?;

        // Data-quality problems discount confidence; they never fail a job.
        let mut warnings = Vec::new();
        if quality.overall() < 0.5 {
            warnings.push(format!(
                "low dataset quality ({:.2}); treat projections with caution",
                quality.overall()
            ));
        }

        let model_metadata = serde_json::to_value(&forecast.metadata)
            .map_err(|e| PipelineError::model(format!("metadata serialization: {e}")))?;
        let results = serde_json::json!({
            "benchmark": benchmark,
            "competitive": competitive,
            "forecast": forecast.scenarios,
            "confidence": quality.overall(),
            "data_quality": quality,
            "warnings": warnings,
        });

        Ok(ExecutedRun {
            fingerprint,
            results,
            model_metadata,
            from_cache: false,
        })
    }

    /// Re-check cancellation, then write the terminal completed state.
    fn commit(&self, job_id: SimulationJobId, run: ExecutedRun) -> PipelineResult<RunOutcome> {
        let now = Utc::now();
        let mut fresh = self
            .store
            .get(job_id)?
            .ok_or(crate::store::JobStoreError::NotFound(job_id))?;

        match fresh.status() {
            JobStatus::Cancelled => return Err(PipelineError::Cancelled),
            JobStatus::Processing => {}
            other => {
                return Err(PipelineError::transient(format!(
                    "job left processing while in flight (now {other})"
                )))
            }
        }

        fresh
            .complete(run.results.clone(), run.model_metadata, now)
            .map_err(|e| PipelineError::transient(e.to_string()))?;
        self.store.update(&fresh)?;

        if run.from_cache {
            Ok(RunOutcome::CompletedFromCache(job_id))
        } else {
            self.result_cache
                .put_at(run.fingerprint, run.results, self.config.result_ttl, now);
            Ok(RunOutcome::Completed(job_id))
        }
    }

    /// Record a failure on the job and, for retryable errors within policy,
    /// requeue it with backoff.
    fn record_failure(
        &self,
        job_id: SimulationJobId,
        err: &PipelineError,
        now: DateTime<Utc>,
    ) -> PipelineResult<()> {
        let Some(mut job) = self.store.get(job_id)? else {
            return Ok(());
        };
        if job.status() != JobStatus::Processing {
            // Cancelled (or otherwise moved on) while we were failing it.
            return Ok(());
        }

        job.fail(err.to_string(), now)
            .map_err(|e| PipelineError::transient(e.to_string()))?;

        let retry_count = job.queue_meta().map_or(0, |m| m.retry_count);
        if err.is_retryable() && self.config.retry_policy.should_retry(retry_count) {
            let delay = self.config.retry_policy.delay_for_attempt(retry_count + 1);
            let retry_at = now + chrono::Duration::from_std(delay).unwrap_or_default();
            job.retry(retry_count + 1, retry_at, now)
                .map_err(|e| PipelineError::transient(e.to_string()))?;
            warn!(
                job_id = %job_id,
                retry_count = retry_count + 1,
                retry_at = %retry_at,
                error = %err,
                "job failed, requeued with backoff"
            );
        } else {
            warn!(job_id = %job_id, error = %err, "job failed terminally");
        }

        self.store.update(&job)?;
        Ok(())
    }

    /// Fail any processing job that has exceeded its stuck threshold.
    pub fn reap_stuck(&self, now: DateTime<Utc>) -> PipelineResult<Vec<SimulationJobId>> {
        let processing = self.store.list_by_status(JobStatus::Processing, usize::MAX)?;
        let mut reaped = Vec::new();

        for mut job in processing {
            let Some(meta) = job.queue_meta() else {
                continue;
            };
            let Some(started_at) = meta.started_at else {
                continue;
            };
            let Ok(elapsed) = (now - started_at).to_std() else {
                continue;
            };
            let limit = meta.estimated_duration.mul_f64(self.config.stuck_factor);
            if elapsed > limit {
                warn!(
                    job_id = %job.id,
                    elapsed_secs = elapsed.as_secs(),
                    limit_secs = limit.as_secs(),
                    "processing job exceeded stuck threshold"
                );
                job.fail(
                    format!(
                        "processing timed out after {}s (limit {}s)",
                        elapsed.as_secs(),
                        limit.as_secs()
                    ),
                    now,
                )
                .map_err(|e| PipelineError::transient(e.to_string()))?;
                self.store.update(&job)?;
                reaped.push(job.id);
            }
        }
        Ok(reaped)
    }

    /// Spawn the worker loop in a background thread.
    pub fn spawn(self) -> WorkerHandle
    where
        S: Send,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        let stats_clone = stats.clone();

        let name = self.config.name.clone();
        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(self, shutdown_rx, stats_clone))
            .unwrap_or_else(|e| panic!("failed to spawn worker thread {name}: {e}"));

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        }
    }
}

struct ExecutedRun {
    fingerprint: String,
    results: JsonValue,
    model_metadata: JsonValue,
    from_cache: bool,
}

fn worker_loop<S: JobStore + 'static>(
    worker: Worker<S>,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<WorkerStats>>,
) {
    info!(worker = %worker.config.name, "simulation worker started");
    let start_time = Instant::now();

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Utc::now();
        if let Err(e) = worker.reap_stuck(now) {
            error!(worker = %worker.config.name, error = %e, "stuck-job sweep failed");
        }

        match worker.run_once(now) {
            Ok(outcome) => {
                if let Ok(mut s) = stats.lock() {
                    s.uptime_secs = start_time.elapsed().as_secs();
                    match outcome {
                        RunOutcome::Idle => {}
                        RunOutcome::Completed(_) => {
                            s.jobs_processed += 1;
                            s.jobs_succeeded += 1;
                        }
                        RunOutcome::CompletedFromCache(_) => {
                            s.jobs_processed += 1;
                            s.jobs_succeeded += 1;
                            s.cache_hits += 1;
                        }
                        RunOutcome::Failed(_) => {
                            s.jobs_processed += 1;
                            s.jobs_failed += 1;
                        }
                        RunOutcome::Cancelled(_) => {
                            s.jobs_processed += 1;
                            s.jobs_cancelled += 1;
                        }
                    }
                }
                if matches!(outcome, RunOutcome::Idle) {
                    thread::sleep(worker.config.poll_interval);
                }
            }
            Err(e) => {
                error!(worker = %worker.config.name, error = %e, "poll cycle failed");
                thread::sleep(worker.config.poll_interval);
            }
        }
    }

    info!(worker = %worker.config.name, "simulation worker stopped");
}
