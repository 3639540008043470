// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use quaero_core::JobId;

#[test]
fn not_found_message_includes_job_id() {
    let id = JobId::from_string("job-abc");
    let err = StoreError::NotFound(id);
    assert!(err.to_string().contains("job-abc"));
}

#[test]
fn cascade_delete_message_lists_errors() {
    let id = JobId::from_string("job-parent");
    let err = StoreError::CascadeDelete { id, errors: vec!["child-1 failed".into()] };
    assert!(err.to_string().contains("child-1 failed"));
}
