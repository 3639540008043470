// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobLog`: append-only per-job log entry.

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Severity of a [`JobLogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

crate::simple_display! {
    LogLevel {
        Error => "error",
        Warn => "warn",
        Info => "info",
        Debug => "debug",
    }
}

/// One append-only log line, weakly owned by its job; deleted in
/// cascade when the job is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub job_id: JobId,
    pub level: LogLevel,
    pub message: String,
    pub timestamp_epoch_ms: u64,
}

/// Ordering for log listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOrder {
    #[default]
    Ascending,
    Descending,
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
