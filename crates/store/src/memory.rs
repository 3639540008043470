// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `JobStore` backend: an embedded KV store for tests and
//! single-process deployments.
//!
//! Backed by a single `parking_lot::RwLock` over a plain map, with direct
//! CRUD mutation instead of event replay.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use quaero_core::{Job, JobId, JobLogEntry, JobStatus, LogLevel, LogOrder, Progress};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;
use crate::types::{ChildStats, ListJobsFilter, LogFilter, ROOT_PARENT};

#[derive(Default)]
struct Tables {
    jobs: HashMap<JobId, Job>,
    logs: Vec<JobLogEntry>,
}

/// Embedded KV backend: one in-process map per entity, no external
/// dependency, used for tests and single-process deployments that don't
/// need the relational store.
pub struct MemoryJobStore {
    tables: RwLock<Tables>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self { tables: RwLock::new(Tables::default()) }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_job(&self, job: Job) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id));
        }
        tables.jobs.insert(job.id, job);
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Job> {
        self.tables
            .read()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(*id))
    }

    async fn update_job_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error: Option<String>,
        now_epoch_ms: u64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = tables.jobs.get_mut(id).ok_or_else(|| StoreError::NotFound(*id))?;
        if !job.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: job.status.to_string(),
                to: status.to_string(),
            });
        }
        job.status = status;
        job.error = error;
        match status {
            JobStatus::Running => job.started_at_epoch_ms = Some(now_epoch_ms),
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                job.completed_at_epoch_ms = Some(now_epoch_ms);
            }
            JobStatus::Pending => {}
        }
        Ok(())
    }

    async fn update_job_progress(&self, id: &JobId, progress: Progress) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = tables.jobs.get_mut(id).ok_or_else(|| StoreError::NotFound(*id))?;
        job.progress = progress;
        Ok(())
    }

    async fn update_job_metadata(
        &self,
        id: &JobId,
        merge: HashMap<String, Value>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = tables.jobs.get_mut(id).ok_or_else(|| StoreError::NotFound(*id))?;
        job.metadata.extend(merge);
        Ok(())
    }

    async fn increment_document_count(&self, id: &JobId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = tables.jobs.get_mut(id).ok_or_else(|| StoreError::NotFound(*id))?;
        let current = job.document_count();
        job.metadata.insert("document_count".to_string(), Value::from(current + 1));
        Ok(())
    }

    async fn update_job_result(&self, id: &JobId, result: Option<Vec<u8>>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = tables.jobs.get_mut(id).ok_or_else(|| StoreError::NotFound(*id))?;
        job.result = result;
        Ok(())
    }

    async fn increment_progress_total(&self, parent_id: &JobId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = tables.jobs.get_mut(parent_id).ok_or_else(|| StoreError::NotFound(*parent_id))?;
        job.progress.total += 1;
        Ok(())
    }

    async fn list_jobs(&self, filter: ListJobsFilter) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read();
        let mut jobs: Vec<Job> = tables
            .jobs
            .values()
            .filter(|job| match &filter.parent_id {
                Some(p) if p == ROOT_PARENT => job.is_parent(),
                Some(p) => job.parent_id.as_str() == p.as_str(),
                None => true,
            })
            .filter(|job| filter.status.map(|s| s == job.status).unwrap_or(true))
            .filter(|job| {
                filter.job_type.as_deref().map(|t| t == job.job_type).unwrap_or(true)
            })
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at_epoch_ms);
        let offset = filter.offset.unwrap_or(0) as usize;
        let jobs = jobs.into_iter().skip(offset);
        Ok(match filter.limit {
            Some(limit) => jobs.take(limit as usize).collect(),
            None => jobs.collect(),
        })
    }

    async fn get_child_jobs(&self, parent_id: &JobId) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read();
        let mut children: Vec<Job> =
            tables.jobs.values().filter(|j| &j.parent_id == parent_id).cloned().collect();
        children.sort_by_key(|j| j.created_at_epoch_ms);
        Ok(children)
    }

    async fn get_child_stats(
        &self,
        parent_ids: &[JobId],
    ) -> StoreResult<HashMap<JobId, ChildStats>> {
        let tables = self.tables.read();
        let mut stats: HashMap<JobId, ChildStats> =
            parent_ids.iter().map(|id| (*id, ChildStats::default())).collect();
        for job in tables.jobs.values() {
            if let Some(entry) = stats.get_mut(&job.parent_id) {
                entry.child_count += 1;
                match job.status {
                    JobStatus::Completed => entry.completed_children += 1,
                    JobStatus::Failed => entry.failed_children += 1,
                    _ => {}
                }
            }
        }
        Ok(stats)
    }

    async fn delete_job(&self, id: &JobId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if !tables.jobs.contains_key(id) {
            return Err(StoreError::NotFound(*id));
        }
        let child_ids: Vec<JobId> =
            tables.jobs.values().filter(|j| &j.parent_id == id).map(|j| j.id).collect();
        for child_id in &child_ids {
            tables.jobs.remove(child_id);
            tables.logs.retain(|l| &l.job_id != child_id);
        }
        tables.jobs.remove(id);
        tables.logs.retain(|l| &l.job_id != id);
        Ok(())
    }

    async fn append_job_log(
        &self,
        id: &JobId,
        level: LogLevel,
        message: String,
        now_epoch_ms: u64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if !tables.jobs.contains_key(id) {
            return Err(StoreError::NotFound(*id));
        }
        tables.logs.push(JobLogEntry { job_id: *id, level, message, timestamp_epoch_ms: now_epoch_ms });
        Ok(())
    }

    async fn get_job_logs(&self, id: &JobId, filter: LogFilter) -> StoreResult<Vec<JobLogEntry>> {
        let tables = self.tables.read();
        Ok(apply_log_filter(
            tables.logs.iter().filter(|l| &l.job_id == id).cloned().collect(),
            filter,
        ))
    }

    async fn get_aggregated_job_logs(
        &self,
        parent_id: &JobId,
        filter: LogFilter,
    ) -> StoreResult<Vec<JobLogEntry>> {
        let tables = self.tables.read();
        let child_ids: std::collections::HashSet<JobId> =
            tables.jobs.values().filter(|j| &j.parent_id == parent_id).map(|j| j.id).collect();
        let entries: Vec<JobLogEntry> = tables
            .logs
            .iter()
            .filter(|l| &l.job_id == parent_id || child_ids.contains(&l.job_id))
            .cloned()
            .collect();
        Ok(apply_log_filter(entries, filter))
    }
}

fn apply_log_filter(mut entries: Vec<JobLogEntry>, filter: LogFilter) -> Vec<JobLogEntry> {
    entries.sort_by_key(|e| e.timestamp_epoch_ms);
    if filter.order == LogOrder::Descending {
        entries.reverse();
    }
    let entries = entries.into_iter().filter(|e| filter.level.map(|l| l == e.level).unwrap_or(true));
    match filter.limit {
        Some(limit) => entries.take(limit as usize).collect(),
        None => entries.collect(),
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
