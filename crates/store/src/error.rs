// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the persistence layer.

use thiserror::Error;

use quaero_core::JobId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("invalid status transition for job {id}: {from} -> {to}")]
    InvalidTransition { id: JobId, from: String, to: String },

    #[error("store contention exhausted retry budget for job {0}")]
    Contention(JobId),

    #[error("job {0} already exists")]
    AlreadyExists(JobId),

    #[error("cascade delete of job {id} failed: {errors:?}")]
    CascadeDelete { id: JobId, errors: Vec<String> },

    #[error("backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
