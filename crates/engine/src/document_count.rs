// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background listener that turns `DocumentSaved` events into
//! `document_count` increments on the saving job's parent.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use quaero_core::{Clock, Event};
use quaero_eventbus::EventBus;

use crate::job_manager::JobManager;

/// Subscribes to the `document_saved` topic for the lifetime of the
/// returned task and increments `JobManager::increment_document_count` for
/// each event's parent. One listener serves every monitored parent; there
/// is no per-parent subscription to manage.
pub struct DocumentCountListener {
    cancel: CancellationToken,
}

impl DocumentCountListener {
    pub fn spawn<C: Clock>(manager: Arc<JobManager<C>>, bus: Arc<EventBus>) -> Self {
        let cancel = CancellationToken::new();
        let (mut rx, _unsub) = bus.subscribe("document_saved", 64);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => return,
                    event = rx.recv() => {
                        let Some(event) = event else { return };
                        if let Event::DocumentSaved { parent_id, .. } = event {
                            if let Err(err) = manager.increment_document_count(&parent_id).await {
                                tracing::error!(parent_id = %parent_id, error = %err, "failed to increment document count");
                            }
                        }
                    }
                }
            }
        });
        Self { cancel }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for DocumentCountListener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "document_count_tests.rs"]
mod tests;
