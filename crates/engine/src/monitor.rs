// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobMonitor`: per-parent background progress aggregator.
//!
//! Each monitored parent gets its own cooperative task, cancelled via the
//! same `CancellationToken`-per-unit-of-work pattern the pack uses for
//! per-connection cancellation, generalized here to a periodic polling
//! loop instead of a single request/response race.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use quaero_core::{Clock, JobId, Progress};
use quaero_eventbus::{Event, EventBus};
use quaero_store::JobStore;

use crate::job_manager::{settlement_status, JobManager};

/// Background aggregator that watches child statistics for monitored
/// parents and settles them once all children reach a terminal state.
/// The monitored-parents map is the one process-wide mutable state this
/// crate carries.
pub struct JobMonitor<C: Clock> {
    manager: Arc<JobManager<C>>,
    store: Arc<dyn JobStore>,
    bus: Arc<EventBus>,
    tick_interval: Duration,
    monitored: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
}

impl<C: Clock> JobMonitor<C> {
    pub fn new(
        manager: Arc<JobManager<C>>,
        store: Arc<dyn JobStore>,
        bus: Arc<EventBus>,
        tick_interval: Duration,
    ) -> Self {
        Self { manager, store, bus, tick_interval, monitored: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Idempotent: calling twice for the same parent results in exactly one
    /// running task.
    pub fn start_monitoring(&self, parent_id: JobId) {
        let mut monitored = self.monitored.lock();
        if monitored.contains_key(&parent_id) {
            return;
        }
        let cancel = CancellationToken::new();
        monitored.insert(parent_id, cancel.clone());
        drop(monitored);

        let manager = Arc::clone(&self.manager);
        let store = Arc::clone(&self.store);
        let bus = Arc::clone(&self.bus);
        let tick_interval = self.tick_interval;
        let monitored_map = Arc::clone(&self.monitored);
        tokio::spawn(async move {
            run_monitor_loop(parent_id, manager, store, bus, tick_interval, cancel).await;
            monitored_map.lock().remove(&parent_id);
        });
    }

    pub fn stop_monitoring(&self, parent_id: &JobId) {
        if let Some(cancel) = self.monitored.lock().remove(parent_id) {
            cancel.cancel();
        }
    }

    pub fn is_monitored(&self, parent_id: &JobId) -> bool {
        self.monitored.lock().contains_key(parent_id)
    }
}

async fn run_monitor_loop<C: Clock>(
    parent_id: JobId,
    manager: Arc<JobManager<C>>,
    store: Arc<dyn JobStore>,
    bus: Arc<EventBus>,
    tick_interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(parent_id = %parent_id, "monitor loop cancelled");
                return;
            }
            _ = tokio::time::sleep(tick_interval) => {}
        }

        let stats = match store.get_child_stats(std::slice::from_ref(&parent_id)).await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::error!(parent_id = %parent_id, error = %err, "failed to fetch child stats");
                continue;
            }
        };
        let Some(stats) = stats.get(&parent_id).copied() else { continue };

        let progress = Progress {
            total: stats.child_count,
            completed: stats.completed_children,
            failed: stats.failed_children,
            current: None,
        };
        if let Err(err) = manager.update_progress(&parent_id, progress).await {
            tracing::error!(parent_id = %parent_id, error = %err, "failed to update parent progress");
            continue;
        }
        bus.publish(Event::JobProgress {
            parent_id,
            total: progress.total,
            completed: progress.completed,
            failed: progress.failed,
        });

        if let Some(final_status) = settlement_status(progress.total, progress.completed, progress.failed) {
            let result = match final_status {
                quaero_core::JobStatus::Completed => manager.mark_completed(&parent_id, None).await,
                _ => {
                    manager
                        .mark_failed(
                            &parent_id,
                            format!("{} of {} children failed", progress.failed, progress.total),
                        )
                        .await
                }
            };
            if let Err(err) = result {
                tracing::error!(parent_id = %parent_id, error = %err, "failed to settle parent");
            }
            return;
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
