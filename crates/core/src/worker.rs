// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identifier and the plug-in `Worker` trait.
//!
//! Workers are the only "polymorphism" in the core: they are values
//! satisfying a small interface, registered in a mapping keyed by job
//! type at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::job::Job;

/// Unique identifier for a registered worker implementation (keyed by the
/// job `type` string it handles, not content-addressed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for WorkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Outcome of a worker's `execute` call.
pub type WorkerResult = Result<Option<Vec<u8>>, String>;

/// A plug-in that performs the actual work for one job `type`.
/// Implementations may call back into `JobManager::create_child_job`
/// to spawn follow-up work while running (e.g. a crawler discovering
/// links).
#[async_trait]
pub trait Worker: Send + Sync {
    /// Execute the given job. `Ok(Some(bytes))` becomes the job's `result`;
    /// `Ok(None)` completes the job with no result payload; `Err` fails the
    /// job with the returned message.
    async fn execute(&self, job: &Job) -> WorkerResult;
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
