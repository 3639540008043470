// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine's error taxonomy, composed from the per-crate errors of its
//! dependencies plus the failure modes that only make sense once a
//! `JobManager`/`WorkerPool`/`Orchestrator` exists.

use thiserror::Error;

use quaero_core::definition::DefinitionError;
use quaero_core::JobId;
use quaero_queue::QueueError;
use quaero_store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// A queue message named a job type with no registered worker.
    #[error("no worker registered for job type '{0}'")]
    NoWorkerRegistered(String),

    /// A definition step named an action with no registered `StepManager`.
    #[error("no step manager registered for action '{0}'")]
    NoStepManager(String),

    /// A step's `config` bytes did not parse into the shape its manager
    /// expects.
    #[error("invalid config for step '{0}': {1}")]
    InvalidStepConfig(String, String),

    /// The worker itself returned an error. Carried separately from
    /// `StoreError` so callers can tell "the job failed" from "we failed to
    /// record that it failed".
    #[error("worker failed for job {job_id}: {message}")]
    WorkerFailed { job_id: JobId, message: String },

    #[error("job {0} exceeded the redelivery limit")]
    QueueExhausted(JobId),

    /// A step's parent did not settle within its configured timeout.
    #[error("step '{0}' timed out waiting for its parent job to settle")]
    StepTimeout(String),

    /// Shutdown or caller cancellation, not recorded as a job failure.
    #[error("operation cancelled")]
    Cancelled,
}

pub type EngineResult<T> = Result<T, EngineError>;
