// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `JobStore` trait: the persistence contract consumed by
//! `JobManager`, `JobMonitor`, and the log endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use quaero_core::{Job, JobId, JobLogEntry, JobStatus, LogLevel, Progress};

use crate::error::StoreResult;
use crate::types::{ChildStats, ListJobsFilter, LogFilter};

/// Atomic read/modify/write persistence for Jobs and their logs. Both the
/// SQLite-backed and in-memory backends implement the same contract so the
/// engine can run against either interchangeably.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: Job) -> StoreResult<()>;

    async fn get_job(&self, id: &JobId) -> StoreResult<Job>;

    async fn update_job_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error: Option<String>,
        now_epoch_ms: u64,
    ) -> StoreResult<()>;

    async fn update_job_progress(&self, id: &JobId, progress: Progress) -> StoreResult<()>;

    /// Set the job's result payload, written on success. Separate from
    /// `update_job_status` so `MarkCompleted`'s optional
    /// result doesn't force every status transition to thread a result
    /// argument through.
    async fn update_job_result(&self, id: &JobId, result: Option<Vec<u8>>) -> StoreResult<()>;

    async fn update_job_metadata(
        &self,
        id: &JobId,
        merge: HashMap<String, Value>,
    ) -> StoreResult<()>;

    async fn increment_document_count(&self, id: &JobId) -> StoreResult<()>;

    /// Atomically bump `progress.total` by one; called whenever a child job
    /// is created under a parent.
    async fn increment_progress_total(&self, parent_id: &JobId) -> StoreResult<()>;

    async fn list_jobs(&self, filter: ListJobsFilter) -> StoreResult<Vec<Job>>;

    async fn get_child_jobs(&self, parent_id: &JobId) -> StoreResult<Vec<Job>>;

    async fn get_child_stats(&self, parent_ids: &[JobId]) -> StoreResult<HashMap<JobId, ChildStats>>;

    /// Cascade-delete `id`, its logs, its children, and the children's logs,
    /// recursing at most one level.
    async fn delete_job(&self, id: &JobId) -> StoreResult<()>;

    async fn append_job_log(
        &self,
        id: &JobId,
        level: LogLevel,
        message: String,
        now_epoch_ms: u64,
    ) -> StoreResult<()>;

    async fn get_job_logs(&self, id: &JobId, filter: LogFilter) -> StoreResult<Vec<JobLogEntry>>;

    /// Union of `parent_id`'s own logs and every child's logs.
    async fn get_aggregated_job_logs(
        &self,
        parent_id: &JobId,
        filter: LogFilter,
    ) -> StoreResult<Vec<JobLogEntry>>;
}
