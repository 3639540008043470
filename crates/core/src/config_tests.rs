// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_matches_spec_defaults() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.worker_concurrency, 4);
    assert_eq!(cfg.redelivery_limit, 3);
    assert_eq!(cfg.monitor_tick_interval, Duration::from_secs(5));
    assert_eq!(cfg.drain_timeout, Duration::from_secs(30));
}

#[test]
fn backoff_ladder_has_five_steps_doubling() {
    assert_eq!(CONTENTION_BACKOFF_MS, [50, 100, 200, 400, 800]);
}
