// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events fanned out by the [`EventBus`](../eventbus).
//!
//! `Event` is the payload type; the bus itself (topic registry, bounded
//! subscriber channels, lossy fanout) lives in `quaero-eventbus` so this
//! crate stays free of any pub/sub machinery.

use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobStatus};
use crate::log::LogLevel;

/// The five lifecycle event variants the engine publishes, plus the
/// `topic()` each is published under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    JobCreated { job_id: JobId, parent_id: JobId, job_type: String, status: JobStatus },
    JobStatusChange { job_id: JobId, from: JobStatus, to: JobStatus, error: Option<String> },
    JobProgress { parent_id: JobId, total: u64, completed: u64, failed: u64 },
    DocumentSaved { job_id: JobId, parent_id: JobId, document_id: String },
    JobLogAppended { job_id: JobId, level: LogLevel, message: String, timestamp_epoch_ms: u64 },
}

impl Event {
    /// Topic name this event is published under. `EventBus::subscribe`
    /// filters on this string.
    pub fn topic(&self) -> &'static str {
        match self {
            Event::JobCreated { .. } => "job_created",
            Event::JobStatusChange { .. } => "job_status_change",
            Event::JobProgress { .. } => "job_progress",
            Event::DocumentSaved { .. } => "document_saved",
            Event::JobLogAppended { .. } => "job_log_appended",
        }
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            Event::JobCreated { job_id, .. }
            | Event::JobStatusChange { job_id, .. }
            | Event::DocumentSaved { job_id, .. }
            | Event::JobLogAppended { job_id, .. } => job_id,
            Event::JobProgress { parent_id, .. } => parent_id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
