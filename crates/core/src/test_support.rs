// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake [`Worker`] implementations shared by every crate's test suite.
//! Gated behind the `test-support` feature so production builds never link
//! this code.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::job::Job;
use crate::worker::{Worker, WorkerResult};

/// Always succeeds, returning a fixed result payload.
pub struct FakeWorker {
    result: Option<Vec<u8>>,
}

impl FakeWorker {
    pub fn new() -> Self {
        Self { result: None }
    }

    pub fn with_result(result: Vec<u8>) -> Self {
        Self { result: Some(result) }
    }
}

impl Default for FakeWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for FakeWorker {
    async fn execute(&self, _job: &Job) -> WorkerResult {
        Ok(self.result.clone())
    }
}

/// Always fails with a fixed message.
pub struct FailingWorker {
    message: String,
}

impl FailingWorker {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
impl Worker for FailingWorker {
    async fn execute(&self, _job: &Job) -> WorkerResult {
        Err(self.message.clone())
    }
}

/// Fails the first `flaky_attempts` calls, then succeeds. Used to exercise
/// the Orchestrator's `retry` `on_error` strategy.
pub struct FlakyWorker {
    flaky_attempts: u32,
    attempts: AtomicU32,
}

impl FlakyWorker {
    pub fn new(flaky_attempts: u32) -> Self {
        Self { flaky_attempts, attempts: AtomicU32::new(0) }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for FlakyWorker {
    async fn execute(&self, _job: &Job) -> WorkerResult {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.flaky_attempts {
            Err(format!("attempt {attempt} failed"))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
