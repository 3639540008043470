// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobManager`: CRUD over jobs plus state-machine enforcement. The only
//! component that both mutates the store and publishes `EventBus` events
//! for a transition, in the same call, so observers never see a status
//! change without its matching event.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use quaero_core::{Clock, Job, JobConfig, JobId, JobStatus, LogLevel, Progress};
use quaero_eventbus::{Event, EventBus};
use quaero_queue::Queue;
use quaero_store::{JobStore, LogFilter};

use crate::error::EngineResult;

/// CRUD + state-machine enforcement over jobs, backed by a [`JobStore`] and
/// a [`Queue`], publishing lifecycle events to an [`EventBus`].
pub struct JobManager<C: Clock> {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn Queue>,
    bus: Arc<EventBus>,
    clock: C,
}

impl<C: Clock> JobManager<C> {
    pub fn new(store: Arc<dyn JobStore>, queue: Arc<dyn Queue>, bus: Arc<EventBus>, clock: C) -> Self {
        Self { store, queue, bus, clock }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn queue(&self) -> &Arc<dyn Queue> {
        &self.queue
    }

    /// Create a parent (root) job. `enqueue` is false for aggregator-only
    /// parents whose only purpose is to collect children.
    pub async fn create_parent_job(
        &self,
        job_type: impl Into<String>,
        action: Option<String>,
        payload: Vec<u8>,
        metadata: HashMap<String, Value>,
        enqueue: bool,
    ) -> EngineResult<Job> {
        let mut builder = JobConfig::builder(job_type).payload(payload).metadata(metadata);
        if let Some(action) = action {
            builder = builder.action(action);
        }
        let config = builder.build();
        let job = Job::new(config, self.clock.epoch_ms());
        self.store.create_job(job.clone()).await?;
        self.bus.publish(Event::JobCreated {
            job_id: job.id,
            parent_id: job.parent_id,
            job_type: job.job_type.clone(),
            status: job.status,
        });
        if enqueue {
            self.queue.enqueue(job.id, job.job_type.clone(), job.payload.clone(), None).await?;
        }
        Ok(job)
    }

    /// Create a child under `parent_id`, enqueue it, and bump the parent's
    /// `progress.total`.
    pub async fn create_child_job(
        &self,
        parent_id: &JobId,
        job_type: impl Into<String>,
        payload: Vec<u8>,
    ) -> EngineResult<Job> {
        let config = JobConfig::builder(job_type).parent_id(*parent_id).payload(payload).build();
        let job = Job::new(config, self.clock.epoch_ms());
        self.store.create_job(job.clone()).await?;
        self.store.increment_progress_total(parent_id).await?;
        self.bus.publish(Event::JobCreated {
            job_id: job.id,
            parent_id: job.parent_id,
            job_type: job.job_type.clone(),
            status: job.status,
        });
        self.queue.enqueue(job.id, job.job_type.clone(), job.payload.clone(), None).await?;
        Ok(job)
    }

    async fn transition(&self, id: &JobId, to: JobStatus, error: Option<String>) -> EngineResult<()> {
        let job = self.store.get_job(id).await?;
        let from = job.status;
        self.store.update_job_status(id, to, error.clone(), self.clock.epoch_ms()).await?;
        tracing::info!(job_id = %id, from = %from, to = %to, "job status transition");
        self.bus.publish(Event::JobStatusChange { job_id: *id, from, to, error });
        Ok(())
    }

    /// A redelivered message whose worker crashed after the first
    /// `mark_running` lands here with the job already `running`; that's a
    /// no-op rather than an invalid-transition error, so a fresh worker can
    /// still pick the message back up.
    pub async fn mark_running(&self, id: &JobId) -> EngineResult<()> {
        let job = self.store.get_job(id).await?;
        if job.status == JobStatus::Running {
            return Ok(());
        }
        self.transition(id, JobStatus::Running, None).await
    }

    pub async fn mark_completed(&self, id: &JobId, result: Option<Vec<u8>>) -> EngineResult<()> {
        if let Some(result) = result {
            self.store.update_job_result(id, Some(result)).await?;
        }
        self.transition(id, JobStatus::Completed, None).await
    }

    pub async fn mark_failed(&self, id: &JobId, error: impl Into<String>) -> EngineResult<()> {
        self.transition(id, JobStatus::Failed, Some(error.into())).await
    }

    /// A public operation any caller may invoke. Cancels `id` and, if it
    /// is a parent, cascades to every non-terminal child.
    pub async fn cancel_job(&self, id: &JobId) -> EngineResult<()> {
        let job = self.store.get_job(id).await?;
        if !job.status.is_terminal() {
            self.transition(id, JobStatus::Cancelled, None).await?;
        }
        if job.is_parent() {
            let children = self.store.get_child_jobs(id).await?;
            for child in children {
                if !child.status.is_terminal() {
                    self.transition(&child.id, JobStatus::Cancelled, None).await?;
                }
            }
        }
        Ok(())
    }

    /// Called when a `DocumentSaved` event observes a child's document
    /// save. `document_count` is driven only by this event, never
    /// recomputed from progress.
    pub async fn increment_document_count(&self, parent_id: &JobId) -> EngineResult<()> {
        self.store.increment_document_count(parent_id).await?;
        Ok(())
    }

    pub async fn get_job(&self, id: &JobId) -> EngineResult<Job> {
        Ok(self.store.get_job(id).await?)
    }

    pub async fn update_progress(&self, id: &JobId, progress: Progress) -> EngineResult<()> {
        self.store.update_job_progress(id, progress).await?;
        Ok(())
    }

    pub async fn append_log(&self, id: &JobId, level: LogLevel, message: impl Into<String>) -> EngineResult<()> {
        let message = message.into();
        self.store.append_job_log(id, level, message.clone(), self.clock.epoch_ms()).await?;
        self.bus.publish(Event::JobLogAppended {
            job_id: *id,
            level,
            message,
            timestamp_epoch_ms: self.clock.epoch_ms(),
        });
        Ok(())
    }

    pub async fn get_logs(&self, id: &JobId, filter: LogFilter) -> EngineResult<Vec<quaero_core::JobLogEntry>> {
        Ok(self.store.get_job_logs(id, filter).await?)
    }

    pub async fn delete_job(&self, id: &JobId) -> EngineResult<()> {
        self.store.delete_job(id).await?;
        Ok(())
    }
}

/// Settle a parent job given its current child statistics, shared between
/// `JobMonitor` and any `StepManager` that settles a non-spawning parent
/// directly.
pub fn settlement_status(total: u64, completed: u64, failed: u64) -> Option<JobStatus> {
    if total > 0 && completed + failed >= total {
        Some(if failed == 0 { JobStatus::Completed } else { JobStatus::Failed })
    } else {
        None
    }
}

#[cfg(test)]
#[path = "job_manager_tests.rs"]
mod tests;
