// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized `QUAERO_*` environment variable access, in the same shape
//! as the daemon's `env` module this crate is grounded on: one function
//! per variable, parsed with a documented default.

use std::time::Duration;

/// Worker pool concurrency (default: 4).
pub fn worker_concurrency() -> usize {
    std::env::var("QUAERO_WORKER_CONCURRENCY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(4)
}

/// Queue message redelivery limit before a message is dead-lettered
/// (default: 3).
pub fn redelivery_limit() -> u32 {
    std::env::var("QUAERO_REDELIVERY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(3)
}

/// `JobMonitor` tick interval (default: 5s).
pub fn monitor_tick_interval() -> Duration {
    std::env::var("QUAERO_MONITOR_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Graceful shutdown drain window (default: 30s).
pub fn drain_timeout() -> Duration {
    std::env::var("QUAERO_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Default queue message visibility timeout.
pub fn visibility_timeout() -> Duration {
    std::env::var("QUAERO_VISIBILITY_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// SQLite connection string, when the relational backend is selected.
pub fn database_url() -> Option<String> {
    std::env::var("QUAERO_DATABASE_URL").ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
