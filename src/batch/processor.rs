//! Bounded concurrent batch processing.

use super::hooks::BatchHooks;
use super::job::{
    BatchInput, BatchJob, BatchOptions, BatchStatus, BatchSummary, JobResult, JobStatus,
    ProcessingJob,
};
use crate::error::{Error, Result};
use crate::pipeline::{DeckProcessor, DeckResult};
use crate::timeline::{DurationPolicy, WordRatePolicy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::{watch, Semaphore};

/// Progress callback: the changed job, finished job count, batch size.
pub type ProgressFn = dyn Fn(&ProcessingJob, usize, usize) + Send + Sync;

struct JobEntry {
    job: ProcessingJob,
    input: Option<Vec<u8>>,
    cancel: watch::Sender<bool>,
}

#[derive(Default)]
struct Registry {
    batches: HashMap<String, BatchJob>,
    jobs: HashMap<String, JobEntry>,
}

impl Registry {
    fn recount(&mut self, batch_id: &str) {
        let Some(batch) = self.batches.get_mut(batch_id) else {
            return;
        };
        let jobs = &self.jobs;
        let job_ids = batch.job_ids.clone();
        batch.recount(job_ids.iter().filter_map(|id| jobs.get(id).map(|e| &e.job)));
    }

    fn counts(&self, batch_id: &str) -> (usize, usize) {
        self.batches
            .get(batch_id)
            .map_or((0, 0), |b| (b.finished(), b.total_files))
    }

    /// Flag a non-terminal job as cancelled. Returns false when it already
    /// finished.
    fn cancel(&mut self, job_id: &str) -> bool {
        let Some(entry) = self.jobs.get_mut(job_id) else {
            return false;
        };
        if entry.job.status.is_terminal() {
            return false;
        }
        entry.job.status = JobStatus::Cancelled;
        entry.job.phase = "cancelled".to_string();
        entry.input = None;
        // A closed receiver means no worker is listening
        let _ = entry.cancel.send(true);
        let batch_id = entry.job.batch_id.clone();
        self.recount(&batch_id);
        true
    }
}

/// A job update to apply through the registry.
enum Update {
    Stage(JobStatus, String, u8),
    Retrying(u32, String),
    Done(JobResult),
    Failed(String),
}

/// Runs deck pipelines for many files with a concurrency cap.
///
/// Each processor owns its registry of batches and jobs.
///
/// # Example
///
/// ```no_run
/// use deckflow::batch::{BatchInput, BatchOptions, BatchProcessor};
///
/// # async fn run() -> deckflow::Result<()> {
/// let processor = BatchProcessor::new();
/// let inputs = vec![BatchInput::new("a.pptx", std::fs::read("a.pptx")?)];
/// let summary = processor
///     .process_batch(inputs, BatchOptions::default(), |job, done, total| {
///         println!("{} {} ({}/{})", job.filename, job.status, done, total);
///     })
///     .await?;
/// println!("{} completed, {} failed", summary.completed, summary.failed);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BatchProcessor {
    registry: Arc<Mutex<Registry>>,
    hooks: BatchHooks,
    policy: Arc<dyn DurationPolicy>,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchProcessor {
    pub fn new() -> Self {
        Self::with_hooks(BatchHooks::default())
    }

    pub fn with_hooks(hooks: BatchHooks) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            hooks,
            policy: Arc::new(WordRatePolicy::default()),
        }
    }

    /// Slide duration policy used by every job.
    pub fn with_policy(mut self, policy: Arc<dyn DurationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a batch of pending jobs without starting them.
    pub fn create_batch(&self, inputs: Vec<BatchInput>, options: BatchOptions) -> BatchJob {
        let mut batch = BatchJob::new(options);
        let mut registry = self.lock();

        for input in inputs {
            let job = ProcessingJob::new(&batch.id, &input.filename);
            let (cancel, _) = watch::channel(false);
            batch.job_ids.push(job.id.clone());
            registry.jobs.insert(
                job.id.clone(),
                JobEntry {
                    job,
                    input: Some(input.data),
                    cancel,
                },
            );
        }

        let job_ids = batch.job_ids.clone();
        batch.recount(
            job_ids
                .iter()
                .filter_map(|id| registry.jobs.get(id).map(|e| &e.job)),
        );
        registry.batches.insert(batch.id.clone(), batch.clone());
        log::info!("batch {} created with {} files", batch.id, batch.total_files);
        batch
    }

    /// Register and run a batch.
    pub async fn process_batch<F>(
        &self,
        inputs: Vec<BatchInput>,
        options: BatchOptions,
        progress: F,
    ) -> Result<BatchSummary>
    where
        F: Fn(&ProcessingJob, usize, usize) + Send + Sync + 'static,
    {
        let batch = self.create_batch(inputs, options);
        self.run_batch(&batch.id, progress).await
    }

    /// Run every pending job of a registered batch to a terminal status.
    ///
    /// At most `max_concurrent` jobs hold a worker slot at once. A failing
    /// file never affects its siblings; the summary reports both.
    pub async fn run_batch<F>(&self, batch_id: &str, progress: F) -> Result<BatchSummary>
    where
        F: Fn(&ProcessingJob, usize, usize) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let progress: Arc<ProgressFn> = Arc::new(progress);

        let (job_ids, options) = {
            let mut registry = self.lock();
            let batch = registry
                .batches
                .get_mut(batch_id)
                .ok_or_else(|| Error::BatchNotFound(batch_id.to_string()))?;
            batch.status = BatchStatus::Processing;
            (batch.job_ids.clone(), batch.options.clone())
        };
        log::info!(
            "batch {} running {} files, {} at a time",
            batch_id,
            job_ids.len(),
            options.concurrency()
        );

        let semaphore = Arc::new(Semaphore::new(options.concurrency()));
        let options = Arc::new(options);
        let mut handles = Vec::with_capacity(job_ids.len());

        for job_id in job_ids.iter().cloned() {
            let worker = Worker {
                processor: self.clone(),
                batch_id: batch_id.to_string(),
                job_id,
                options: Arc::clone(&options),
                progress: Arc::clone(&progress),
            };
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                worker.run().await;
            }));
        }

        for (handle, job_id) in handles.into_iter().zip(&job_ids) {
            if let Err(e) = handle.await {
                log::error!("worker for job {} aborted: {}", job_id, e);
                self.apply(
                    batch_id,
                    job_id,
                    Update::Failed(format!("worker aborted: {}", e)),
                    progress.as_ref(),
                );
            }
        }

        let summary = {
            let mut registry = self.lock();
            registry.recount(batch_id);
            let jobs: Vec<ProcessingJob> = job_ids
                .iter()
                .filter_map(|id| registry.jobs.get(id).map(|e| e.job.clone()))
                .collect();
            let batch = registry
                .batches
                .get_mut(batch_id)
                .ok_or_else(|| Error::BatchNotFound(batch_id.to_string()))?;
            batch.settle();
            BatchSummary::from_jobs(batch, jobs, start.elapsed().as_millis() as u64)
        };

        log::info!(
            "batch {} finished: {} completed, {} failed, {} cancelled in {} ms",
            batch_id,
            summary.completed,
            summary.failed,
            summary.cancelled,
            summary.processing_time
        );
        Ok(summary)
    }

    /// Cancel one job. Pending and in-flight jobs become `cancelled`
    /// immediately; a finished job is left alone and `false` returned.
    pub fn cancel(&self, job_id: &str) -> bool {
        let cancelled = self.lock().cancel(job_id);
        if cancelled {
            log::info!("job {} cancelled", job_id);
        }
        cancelled
    }

    /// Cancel every unfinished job of a batch; returns how many.
    pub fn cancel_batch(&self, batch_id: &str) -> usize {
        let mut registry = self.lock();
        let ids = registry
            .batches
            .get(batch_id)
            .map(|b| b.job_ids.clone())
            .unwrap_or_default();
        ids.iter().filter(|id| registry.cancel(id)).count()
    }

    /// Cancel every unfinished job of every batch; returns how many.
    pub fn cancel_all(&self) -> usize {
        let mut registry = self.lock();
        let ids: Vec<String> = registry.jobs.keys().cloned().collect();
        ids.iter().filter(|id| registry.cancel(id)).count()
    }

    pub fn job(&self, job_id: &str) -> Option<ProcessingJob> {
        self.lock().jobs.get(job_id).map(|e| e.job.clone())
    }

    pub fn jobs(&self) -> Vec<ProcessingJob> {
        self.lock().jobs.values().map(|e| e.job.clone()).collect()
    }

    pub fn batch(&self, batch_id: &str) -> Option<BatchJob> {
        self.lock().batches.get(batch_id).cloned()
    }

    /// Forget batches that reached a terminal status, with their jobs.
    /// Returns the number of jobs removed.
    pub fn clear_finished(&self) -> usize {
        let mut registry = self.lock();
        let finished: Vec<BatchJob> = registry
            .batches
            .values()
            .filter(|b| b.status.is_terminal())
            .cloned()
            .collect();

        let mut removed = 0;
        for batch in finished {
            registry.batches.remove(&batch.id);
            for id in &batch.job_ids {
                if registry.jobs.remove(id).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Apply an update unless the job already finished, then report it.
    ///
    /// Progress never decreases. The callback runs after the registry lock
    /// is released.
    fn apply(&self, batch_id: &str, job_id: &str, update: Update, progress: &ProgressFn) {
        let report = {
            let mut registry = self.lock();
            let Some(entry) = registry.jobs.get_mut(job_id) else {
                return;
            };
            let job = &mut entry.job;
            if job.status.is_terminal() {
                return;
            }

            match update {
                Update::Stage(status, phase, pct) => {
                    job.status = status;
                    job.phase = phase;
                    job.progress = job.progress.max(pct);
                }
                Update::Retrying(attempt, message) => {
                    job.phase = format!("retrying (attempt {})", attempt + 1);
                    job.error = Some(message);
                }
                Update::Done(result) => {
                    job.status = JobStatus::Completed;
                    job.phase = "completed".to_string();
                    job.progress = 100;
                    job.error = None;
                    job.result = Some(result);
                    entry.input = None;
                }
                Update::Failed(message) => {
                    job.status = JobStatus::Failed;
                    job.phase = "failed".to_string();
                    job.error = Some(message);
                    entry.input = None;
                }
            }

            let snapshot = entry.job.clone();
            registry.recount(batch_id);
            let (finished, total) = registry.counts(batch_id);
            (snapshot, finished, total)
        };

        progress(&report.0, report.1, report.2);
    }

    /// Report a job's current state without changing it.
    fn report(&self, batch_id: &str, job_id: &str, progress: &ProgressFn) {
        let report = {
            let registry = self.lock();
            let Some(entry) = registry.jobs.get(job_id) else {
                return;
            };
            let (finished, total) = registry.counts(batch_id);
            (entry.job.clone(), finished, total)
        };
        progress(&report.0, report.1, report.2);
    }
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.lock();
        f.debug_struct("BatchProcessor")
            .field("batches", &registry.batches.len())
            .field("jobs", &registry.jobs.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// One job's run inside a worker slot.
struct Worker {
    processor: BatchProcessor,
    batch_id: String,
    job_id: String,
    options: Arc<BatchOptions>,
    progress: Arc<ProgressFn>,
}

impl Worker {
    async fn run(self) {
        let started = Instant::now();
        let Some((data, filename, mut cancel_rx)) = self.claim() else {
            // Cancelled while waiting for a slot
            self.processor
                .report(&self.batch_id, &self.job_id, self.progress.as_ref());
            return;
        };

        let mut attempt = 0u32;
        loop {
            if *cancel_rx.borrow() {
                break;
            }
            self.set_attempts(attempt + 1);

            let outcome = self
                .attempt(Arc::clone(&data), &filename, cancel_rx.clone(), attempt == 0)
                .await;
            match outcome {
                Ok(result) => {
                    self.processor.apply(
                        &self.batch_id,
                        &self.job_id,
                        Update::Done(result),
                        self.progress.as_ref(),
                    );
                    break;
                }
                Err(Error::Cancelled(_)) => break,
                Err(e) if e.is_retryable() && attempt < self.options.max_retries => {
                    attempt += 1;
                    let wait = self.options.backoff_ms(attempt);
                    log::warn!(
                        "{}: attempt {} failed ({}), retrying in {} ms",
                        filename,
                        attempt,
                        e,
                        wait
                    );
                    self.processor.apply(
                        &self.batch_id,
                        &self.job_id,
                        Update::Retrying(attempt, e.to_string()),
                        self.progress.as_ref(),
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(std::time::Duration::from_millis(wait)) => {}
                        _ = cancel_rx.changed() => {}
                    }
                }
                Err(e) => {
                    let failure = Error::Processing {
                        filename: filename.clone(),
                        message: e.to_string(),
                    };
                    log::error!("{} after {} attempts", failure, attempt + 1);
                    self.processor.apply(
                        &self.batch_id,
                        &self.job_id,
                        Update::Failed(e.to_string()),
                        self.progress.as_ref(),
                    );
                    break;
                }
            }
        }

        self.finish(started.elapsed().as_millis() as u64);
    }

    /// Take the job's input if it is still pending.
    fn claim(&self) -> Option<(Arc<Vec<u8>>, String, watch::Receiver<bool>)> {
        let mut registry = self.processor.lock();
        let entry = registry.jobs.get_mut(&self.job_id)?;
        if entry.job.status != JobStatus::Pending {
            return None;
        }
        let data = entry.input.take()?;
        Some((
            Arc::new(data),
            entry.job.filename.clone(),
            entry.cancel.subscribe(),
        ))
    }

    fn set_attempts(&self, attempts: u32) {
        if let Some(entry) = self.processor.lock().jobs.get_mut(&self.job_id) {
            entry.job.attempts = attempts;
        }
    }

    /// Stamp the elapsed time and report terminal cancellations.
    fn finish(&self, elapsed: u64) {
        let cancelled = {
            let mut registry = self.processor.lock();
            match registry.jobs.get_mut(&self.job_id) {
                Some(entry) => {
                    entry.job.processing_time = Some(elapsed);
                    entry.job.status == JobStatus::Cancelled
                }
                None => false,
            }
        };
        if cancelled {
            self.processor
                .report(&self.batch_id, &self.job_id, self.progress.as_ref());
        }
    }

    /// One full pipeline attempt on a blocking thread.
    ///
    /// Only the first attempt reports `uploading`; a retry keeps the status
    /// the job already reached and moves on from there.
    async fn attempt(
        &self,
        data: Arc<Vec<u8>>,
        filename: &str,
        cancel_rx: watch::Receiver<bool>,
        first: bool,
    ) -> Result<JobResult> {
        let processor = self.processor.clone();
        let batch_id = self.batch_id.clone();
        let job_id = self.job_id.clone();
        let options = Arc::clone(&self.options);
        let progress = Arc::clone(&self.progress);

        let task = tokio::task::spawn_blocking(move || {
            let report =
                |update: Update| processor.apply(&batch_id, &job_id, update, progress.as_ref());
            let cancelled = || *cancel_rx.borrow();

            if first {
                report(Update::Stage(JobStatus::Uploading, "uploading".to_string(), 5));
            }
            if cancelled() {
                return Err(Error::Cancelled(job_id.clone()));
            }

            let store = if options.upload_to_storage {
                processor.hooks.store.clone()
            } else {
                None
            };
            let deck_processor = DeckProcessor::new(options.process.clone())
                .with_store_opt(store)
                .with_policy(Arc::clone(&processor.policy));

            // Pipeline percent maps onto 10..=80 of the job
            let mut on_stage = |stage: &str, pct: u8| {
                let mapped = 10 + (u16::from(pct) * 70 / 100) as u8;
                report(Update::Stage(JobStatus::Processing, stage.to_string(), mapped));
            };
            let deck = deck_processor.process_cancellable(
                (*data).clone(),
                &job_id,
                &mut on_stage,
                &cancelled,
            )?;

            let narration_generated = match (&processor.hooks.narration, options.generate_narration) {
                (Some(hook), true) => {
                    report(Update::Stage(
                        JobStatus::GeneratingNarration,
                        "generating-narration".to_string(),
                        85,
                    ));
                    hook.generate(&deck, options.narration_options.as_ref())?;
                    true
                }
                _ => false,
            };
            if cancelled() {
                return Err(Error::Cancelled(job_id.clone()));
            }

            if options.auto_save {
                if let Some(sink) = &processor.hooks.sink {
                    report(Update::Stage(JobStatus::Processing, "saving".to_string(), 95));
                    sink.save(&deck)?;
                }
            }

            Ok(job_result(&deck, narration_generated))
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(Error::Processing {
                filename: filename.to_string(),
                message: format!("pipeline task aborted: {}", e),
            }),
        }
    }
}

fn job_result(deck: &DeckResult, narration_generated: bool) -> JobResult {
    JobResult {
        project_id: deck.project_id.clone(),
        slide_count: deck.slide_count(),
        duration: deck.total_duration(),
        thumbnail: deck.thumbnail.clone(),
        narration_generated,
        storage_keys: deck.storage_keys(),
    }
}
