//! Batch orchestration.
//!
//! A [`BatchProcessor`] runs the single-deck pipeline for many files under
//! a concurrency cap. Every file has its own [`ProcessingJob`] moving
//! through `pending → uploading → processing → completed | failed |
//! cancelled`; failures stay with their file and are retried with
//! exponential backoff before the job is marked failed.

mod hooks;
mod job;
mod processor;

pub use hooks::{AssetStore, BatchHooks, MemoryAssetStore, NarrationHook, ProjectSink};
pub use job::{
    BatchInput, BatchJob, BatchOptions, BatchStatus, BatchSummary, JobResult, JobStatus,
    ProcessingJob, MAX_RETRY_BACKOFF_MS,
};
pub use processor::{BatchProcessor, ProgressFn};
