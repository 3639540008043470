// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, status state machine, and the `Job` record itself.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a job instance (parent or child).
    pub struct JobId("job-");
}

/// The distinguished "type tag" reserved for parent jobs; a child's
/// `type` is never `parent`.
pub const PARENT_JOB_TYPE: &str = "parent";

/// Status of a job. Transitions are enforced by `JobManager`, not by this
/// type — `Job` itself is a plain data record so stores can deserialize it
/// without re-validating history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// True once a job has reached any of `{completed, failed, cancelled}`.
    /// Terminal states never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Validate a single hop of the state machine:
    ///
    /// ```text
    /// pending ──► running ──► completed
    ///                    │
    ///                    └──► failed
    /// pending/running ──► cancelled (explicit)
    /// ```
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Pending, Cancelled)
                | (Running, Cancelled)
        )
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Aggregate child-job counters embedded on a parent job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    /// Free-form label for whatever the parent's StepManager considers the
    /// "current" unit of work (e.g. the URL currently being crawled).
    #[serde(default)]
    pub current: Option<String>,
}

impl Progress {
    /// True once every counted child has settled and at least one child was
    /// ever counted — a parent with `total == 0` stays running rather than
    /// settling immediately.
    pub fn is_settled(&self) -> bool {
        self.total > 0 && self.completed + self.failed >= self.total
    }
}

/// Parameters for constructing a new [`Job`].
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub id: JobId,
    pub parent_id: JobId,
    pub job_type: String,
    pub action: Option<String>,
    pub payload: Vec<u8>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl JobConfig {
    pub fn builder(job_type: impl Into<String>) -> JobConfigBuilder {
        JobConfigBuilder {
            id: JobId::new(),
            parent_id: JobId::empty(),
            job_type: job_type.into(),
            action: None,
            payload: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}

pub struct JobConfigBuilder {
    id: JobId,
    parent_id: JobId,
    job_type: String,
    action: Option<String>,
    payload: Vec<u8>,
    metadata: HashMap<String, serde_json::Value>,
}

impl JobConfigBuilder {
    pub fn id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }

    pub fn parent_id(mut self, parent_id: JobId) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> JobConfig {
        JobConfig {
            id: self.id,
            parent_id: self.parent_id,
            job_type: self.job_type,
            action: self.action,
            payload: self.payload,
            metadata: self.metadata,
        }
    }
}

/// A job instance: the unit of execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Empty for a parent/root job; otherwise the owning parent's id.
    pub parent_id: JobId,
    pub job_type: String,
    /// For parents originating from a definition step, the step's action
    /// name; used by the Orchestrator to route status polling. `None` for
    /// plain child jobs.
    pub action: Option<String>,
    pub status: JobStatus,
    pub payload: Vec<u8>,
    pub result: Option<Vec<u8>>,
    pub error: Option<String>,
    pub created_at_epoch_ms: u64,
    pub started_at_epoch_ms: Option<u64>,
    pub completed_at_epoch_ms: Option<u64>,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Job {
    pub fn new(config: JobConfig, created_at_epoch_ms: u64) -> Self {
        Self {
            id: config.id,
            parent_id: config.parent_id,
            job_type: config.job_type,
            action: config.action,
            status: JobStatus::Pending,
            payload: config.payload,
            result: None,
            error: None,
            created_at_epoch_ms,
            started_at_epoch_ms: None,
            completed_at_epoch_ms: None,
            progress: Progress::default(),
            metadata: config.metadata,
        }
    }

    /// True for a root/parent job; children never have children of their own.
    pub fn is_parent(&self) -> bool {
        self.parent_id.is_empty()
    }

    pub fn document_count(&self) -> u64 {
        self.metadata
            .get("document_count")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            job_type: String = "crawler_url",
        }
        set {
            parent_id: JobId = JobId::empty(),
            status: JobStatus = JobStatus::Pending,
            payload: Vec<u8> = Vec::new(),
            progress: Progress = Progress::default(),
            metadata: std::collections::HashMap<String, serde_json::Value> = std::collections::HashMap::new(),
        }
        option {
            action: String = None,
            result: Vec<u8> = None,
            error: String = None,
            started_at_epoch_ms: u64 = None,
            completed_at_epoch_ms: u64 = None,
        }
        computed {
            id: JobId = JobId::new(),
            created_at_epoch_ms: u64 = 1_000_000,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
