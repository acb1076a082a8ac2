//! Batch and job records.

use crate::pipeline::ProcessOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest wait between retries, in milliseconds.
pub const MAX_RETRY_BACKOFF_MS: u64 = 10_000;

/// One input file of a batch.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub filename: String,
    pub data: Vec<u8>,
}

impl BatchInput {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Options shared by every file in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchOptions {
    /// Files processed at the same time. Zero is treated as one.
    pub max_concurrent: usize,

    /// Extra attempts after a failed one
    pub max_retries: u32,

    /// Hand extracted images to the asset store hook
    #[serde(alias = "uploadToS3")]
    pub upload_to_storage: bool,

    /// Call the narration hook after processing
    pub generate_narration: bool,

    /// Passed through to the narration hook untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration_options: Option<Value>,

    /// Hand results to the project sink hook
    pub auto_save: bool,

    /// Base of the exponential retry backoff
    pub retry_backoff_ms: u64,

    /// Per-deck feature toggles
    pub process: ProcessOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            max_retries: 2,
            upload_to_storage: true,
            generate_narration: false,
            narration_options: None,
            auto_save: true,
            retry_backoff_ms: 1000,
            process: ProcessOptions::default(),
        }
    }
}

impl BatchOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_upload(mut self, upload: bool) -> Self {
        self.upload_to_storage = upload;
        self
    }

    pub fn with_narration(mut self, generate: bool, options: Option<Value>) -> Self {
        self.generate_narration = generate;
        self.narration_options = options;
        self
    }

    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    pub fn with_retry_backoff(mut self, base_ms: u64) -> Self {
        self.retry_backoff_ms = base_ms;
        self
    }

    pub fn with_process(mut self, process: ProcessOptions) -> Self {
        self.process = process;
        self
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.max_concurrent.max(1)
    }

    /// Wait before retry number `retry` (1-based).
    pub fn backoff_ms(&self, retry: u32) -> u64 {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        self.retry_backoff_ms
            .saturating_mul(factor)
            .min(MAX_RETRY_BACKOFF_MS)
    }
}

/// Per-file state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    #[default]
    Pending,
    Uploading,
    Processing,
    GeneratingNarration,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Holding a worker slot.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobStatus::Uploading | JobStatus::Processing | JobStatus::GeneratingNarration
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Uploading => "uploading",
            JobStatus::Processing => "processing",
            JobStatus::GeneratingNarration => "generating-narration",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch-level state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Cancelled
        )
    }
}

/// What a completed job produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub project_id: String,
    pub slide_count: usize,
    /// Deck timeline length in milliseconds
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub narration_generated: bool,
    #[serde(default)]
    pub storage_keys: Vec<String>,
}

/// One file's processing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    pub id: String,
    pub batch_id: String,
    pub filename: String,
    pub status: JobStatus,
    /// 0..=100, never decreasing
    pub progress: u8,
    /// Human-readable stage label
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempts started so far
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    /// Wall-clock milliseconds from first attempt to terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
}

impl ProcessingJob {
    pub(crate) fn new(batch_id: &str, filename: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            batch_id: batch_id.to_string(),
            filename: filename.to_string(),
            status: JobStatus::Pending,
            progress: 0,
            phase: "pending".to_string(),
            error: None,
            attempts: 0,
            result: None,
            processing_time: None,
        }
    }
}

/// A batch of jobs with aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub id: String,
    pub status: BatchStatus,
    pub total_files: usize,
    pub pending: usize,
    /// Jobs holding a worker slot
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// 0..=100, terminal jobs counting as done
    pub progress: u8,
    pub job_ids: Vec<String>,
    pub options: BatchOptions,
}

impl BatchJob {
    pub(crate) fn new(options: BatchOptions) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: BatchStatus::Pending,
            total_files: 0,
            pending: 0,
            processing: 0,
            completed: 0,
            failed: 0,
            cancelled: 0,
            progress: 0,
            job_ids: Vec::new(),
            options,
        }
    }

    /// Recount from the batch's jobs.
    pub(crate) fn recount<'a>(&mut self, jobs: impl Iterator<Item = &'a ProcessingJob>) {
        let (mut pending, mut processing, mut completed, mut failed, mut cancelled) =
            (0, 0, 0, 0, 0);
        let mut progress_sum = 0usize;
        let mut total = 0usize;

        for job in jobs {
            total += 1;
            match job.status {
                JobStatus::Pending => pending += 1,
                JobStatus::Completed => completed += 1,
                JobStatus::Failed => failed += 1,
                JobStatus::Cancelled => cancelled += 1,
                _ => processing += 1,
            }
            progress_sum += if job.status.is_terminal() {
                100
            } else {
                job.progress as usize
            };
        }

        self.total_files = total;
        self.pending = pending;
        self.processing = processing;
        self.completed = completed;
        self.failed = failed;
        self.cancelled = cancelled;
        self.progress = if total == 0 {
            100
        } else {
            (progress_sum / total) as u8
        };
    }

    /// Jobs that reached a terminal status.
    pub fn finished(&self) -> usize {
        self.completed + self.failed + self.cancelled
    }

    /// Final status once every job is terminal.
    pub(crate) fn settle(&mut self) {
        self.status = if self.total_files > 0 && self.cancelled == self.total_files {
            BatchStatus::Cancelled
        } else if self.completed == 0 && self.failed > 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::Completed
        };
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub batch_id: String,
    pub status: BatchStatus,
    pub total_jobs: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Slides across completed jobs
    pub total_slides: usize,
    /// Timeline milliseconds across completed jobs
    pub total_duration: u64,
    /// Wall-clock milliseconds of the run
    pub processing_time: u64,
    pub jobs: Vec<ProcessingJob>,
    /// `"<filename>: <message>"` per failed job
    pub errors: Vec<String>,
}

impl BatchSummary {
    pub(crate) fn from_jobs(batch: &BatchJob, jobs: Vec<ProcessingJob>, processing_time: u64) -> Self {
        let completed: Vec<&JobResult> = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .filter_map(|j| j.result.as_ref())
            .collect();
        let errors = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Failed)
            .map(|j| {
                format!(
                    "{}: {}",
                    j.filename,
                    j.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();

        Self {
            batch_id: batch.id.clone(),
            status: batch.status,
            total_jobs: batch.total_files,
            completed: batch.completed,
            failed: batch.failed,
            cancelled: batch.cancelled,
            total_slides: completed.iter().map(|r| r.slide_count).sum(),
            total_duration: completed
                .iter()
                .fold(0u64, |total, r| total.saturating_add(r.duration)),
            processing_time,
            jobs,
            errors,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus, progress: u8) -> ProcessingJob {
        ProcessingJob {
            status,
            progress,
            ..ProcessingJob::new("b", "deck.pptx")
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let options = BatchOptions::default();
        assert_eq!(options.backoff_ms(1), 1000);
        assert_eq!(options.backoff_ms(2), 2000);
        assert_eq!(options.backoff_ms(3), 4000);
        assert_eq!(options.backoff_ms(5), 10_000);
        assert_eq!(options.backoff_ms(64), 10_000);
    }

    #[test]
    fn test_zero_concurrency_means_one() {
        assert_eq!(BatchOptions::default().with_max_concurrent(0).concurrency(), 1);
    }

    #[test]
    fn test_options_accept_source_field_names() {
        let options: BatchOptions =
            serde_json::from_str(r#"{"maxConcurrent": 5, "uploadToS3": false}"#).unwrap();
        assert_eq!(options.max_concurrent, 5);
        assert!(!options.upload_to_storage);
        assert_eq!(options.max_retries, 2);
        assert!(options.auto_save);
    }

    #[test]
    fn test_recount_and_settle() {
        let mut batch = BatchJob::new(BatchOptions::default());
        let jobs = vec![
            job(JobStatus::Completed, 100),
            job(JobStatus::Failed, 30),
            job(JobStatus::Processing, 50),
            job(JobStatus::Pending, 0),
        ];
        batch.recount(jobs.iter());
        assert_eq!(
            (batch.completed, batch.failed, batch.processing, batch.pending),
            (1, 1, 1, 1)
        );
        assert_eq!(batch.progress, 62);
        assert!(batch.finished() <= batch.total_files);

        let all_failed = vec![job(JobStatus::Failed, 10), job(JobStatus::Cancelled, 0)];
        batch.recount(all_failed.iter());
        batch.settle();
        assert_eq!(batch.status, BatchStatus::Failed);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(JobStatus::GeneratingNarration.to_string(), "generating-narration");
        assert_eq!(
            serde_json::to_string(&JobStatus::GeneratingNarration).unwrap(),
            "\"generating-narration\""
        );
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::Uploading.is_active());
    }
}
