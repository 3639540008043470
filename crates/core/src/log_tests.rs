// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn log_level_displays_lowercase() {
    assert_eq!(format!("{}", LogLevel::Warn), "warn");
}

#[test]
fn log_order_defaults_to_ascending() {
    assert_eq!(LogOrder::default(), LogOrder::Ascending);
}

#[test]
fn entry_round_trips_through_json() {
    let entry = JobLogEntry {
        job_id: JobId::new(),
        level: LogLevel::Error,
        message: "boom".into(),
        timestamp_epoch_ms: 42,
    };
    let json = serde_json::to_string(&entry).unwrap();
    let back: JobLogEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back.job_id, entry.job_id);
    assert_eq!(back.message, "boom");
}
