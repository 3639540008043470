// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkerPool`: a fixed set of worker tasks polling the queue and
//! dispatching to registered [`Worker`] plug-ins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use quaero_core::{Clock, Worker, WorkerId};
use quaero_queue::{Queue, Received};

use crate::job_manager::JobManager;

/// Registry of `Worker` plug-ins keyed by job type — the only
/// polymorphism in the core.
pub type WorkerRegistry = HashMap<WorkerId, Arc<dyn Worker>>;

/// A fixed-concurrency pool of worker tasks, spawned via a [`JoinSet`] the
/// way the pack's fan-out worker pools do (one task per slot, each
/// looping independently).
pub struct WorkerPool<C: Clock> {
    manager: Arc<JobManager<C>>,
    queue: Arc<dyn Queue>,
    workers: Arc<WorkerRegistry>,
    concurrency: usize,
    visibility_timeout: Duration,
    drain_timeout: Duration,
}

impl<C: Clock> WorkerPool<C> {
    pub fn new(
        manager: Arc<JobManager<C>>,
        queue: Arc<dyn Queue>,
        workers: WorkerRegistry,
        concurrency: usize,
        visibility_timeout: Duration,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            manager,
            queue,
            workers: Arc::new(workers),
            concurrency,
            visibility_timeout,
            drain_timeout,
        }
    }

    /// Spawn `concurrency` worker tasks, returning a [`JoinSet`] the caller
    /// awaits for graceful shutdown. Calling `cancel.cancel()` stops receive
    /// loops from pulling new messages immediately, but an invocation
    /// already running gets `drain_timeout` to finish before its future is
    /// abandoned.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinSet<()> {
        let mut tasks = JoinSet::new();
        for worker_idx in 0..self.concurrency {
            let manager = Arc::clone(&self.manager);
            let queue = Arc::clone(&self.queue);
            let workers = Arc::clone(&self.workers);
            let cancel = cancel.clone();
            let visibility_timeout = self.visibility_timeout;
            let drain_timeout = self.drain_timeout;
            tasks.spawn(async move {
                run_worker_loop(
                    worker_idx,
                    manager,
                    queue,
                    workers,
                    visibility_timeout,
                    drain_timeout,
                    cancel,
                )
                .await;
            });
        }
        tasks
    }

    /// Drain dead-lettered messages (redelivery limit exceeded) and mark
    /// their jobs failed. Intended to be called periodically by the
    /// embedding application; not spawned as its own task here since the
    /// two Queue backends expose `drain_dead_letters` on their concrete
    /// types, not through the `Queue` trait object.
    pub async fn reap_dead_letters(&self, queue: &dyn DrainDeadLetters) -> crate::error::EngineResult<()> {
        for job_id in queue.drain_dead_letters().await? {
            tracing::warn!(job_id = %job_id, "marking job failed: redelivery limit exceeded");
            self.manager.mark_failed(&job_id, "delivery exhausted").await?;
        }
        Ok(())
    }
}

/// Implemented by both concrete queue backends; abstracts their
/// `drain_dead_letters` method for [`WorkerPool::reap_dead_letters`].
#[async_trait::async_trait]
pub trait DrainDeadLetters: Send + Sync {
    async fn drain_dead_letters(&self) -> quaero_queue::QueueResult<Vec<quaero_core::JobId>>;
}

#[async_trait::async_trait]
impl DrainDeadLetters for quaero_queue::MemoryQueue {
    async fn drain_dead_letters(&self) -> quaero_queue::QueueResult<Vec<quaero_core::JobId>> {
        Ok(self.drain_dead_letters())
    }
}

#[async_trait::async_trait]
impl DrainDeadLetters for quaero_queue::SqliteQueue {
    async fn drain_dead_letters(&self) -> quaero_queue::QueueResult<Vec<quaero_core::JobId>> {
        self.drain_dead_letters().await
    }
}

async fn run_worker_loop<C: Clock>(
    worker_idx: usize,
    manager: Arc<JobManager<C>>,
    queue: Arc<dyn Queue>,
    workers: Arc<WorkerRegistry>,
    visibility_timeout: Duration,
    drain_timeout: Duration,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            tracing::debug!(worker_idx, "worker loop exiting: cancelled");
            return;
        }

        let received = match queue.receive(visibility_timeout, &cancel).await {
            Ok(received) => received,
            Err(err) => {
                tracing::error!(worker_idx, error = %err, "queue receive failed");
                continue;
            }
        };

        let (message, handle) = match received {
            Received::Message(message, handle) => (message, handle),
            // On cancellation mid-receive, don't transition anything; let
            // visibility timeout (there was none taken) redeliver naturally.
            Received::Cancelled => return,
        };

        let Some(worker) = workers.get(message.job_type.as_str()) else {
            tracing::warn!(worker_idx, job_type = %message.job_type, "no worker registered");
            if let Err(err) = manager.mark_failed(&message.job_id, "no worker registered").await {
                tracing::error!(worker_idx, error = %err, "failed to record missing-worker failure");
            }
            if let Err(err) = queue.delete(&handle).await {
                tracing::error!(worker_idx, error = %err, "failed to delete message for unroutable job");
            }
            continue;
        };

        if let Err(err) = manager.mark_running(&message.job_id).await {
            tracing::error!(worker_idx, error = %err, "failed to mark job running");
            continue;
        }

        let job = match manager.get_job(&message.job_id).await {
            Ok(job) => job,
            Err(err) => {
                tracing::error!(worker_idx, error = %err, "failed to reload job before execute");
                continue;
            }
        };

        tokio::select! {
            outcome = worker.execute(&job) => {
                match outcome {
                    Ok(result) => {
                        if let Err(err) = manager.mark_completed(&message.job_id, result).await {
                            tracing::error!(worker_idx, error = %err, "failed to mark job completed");
                        }
                    }
                    Err(message_err) => {
                        if let Err(err) = manager.mark_failed(&message.job_id, message_err).await {
                            tracing::error!(worker_idx, error = %err, "failed to mark job failed");
                        }
                    }
                }
                if let Err(err) = queue.delete(&handle).await {
                    tracing::error!(worker_idx, error = %err, "failed to delete processed message");
                }
            }
            _ = drain_deadline(&cancel, drain_timeout) => {
                // Leave the job running; visibility timeout will redeliver
                // the message after restart.
                tracing::info!(worker_idx, job_id = %message.job_id, "drain window elapsed, leaving job running");
                return;
            }
        }
    }
}

/// Resolves `drain` after shutdown is signalled, giving an in-flight
/// invocation a grace period to finish before its future is abandoned.
async fn drain_deadline(cancel: &CancellationToken, drain: Duration) {
    cancel.cancelled().await;
    tokio::time::sleep(drain).await;
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
