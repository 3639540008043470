// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_parent_job_has_empty_parent_id() {
    let config = JobConfig::builder(PARENT_JOB_TYPE).build();
    let job = Job::new(config, 1_000);
    assert!(job.is_parent());
    assert_eq!(job.status, JobStatus::Pending);
}

#[test]
fn child_job_carries_parent_id() {
    let parent_id = JobId::new();
    let config = JobConfig::builder("crawler_url").parent_id(parent_id).build();
    let job = Job::new(config, 1_000);
    assert!(!job.is_parent());
    assert_eq!(job.parent_id, parent_id);
}

#[yare::parameterized(
    pending_to_running = { JobStatus::Pending, JobStatus::Running, true },
    running_to_completed = { JobStatus::Running, JobStatus::Completed, true },
    running_to_failed = { JobStatus::Running, JobStatus::Failed, true },
    pending_to_cancelled = { JobStatus::Pending, JobStatus::Cancelled, true },
    running_to_cancelled = { JobStatus::Running, JobStatus::Cancelled, true },
    running_to_running_is_a_no_op_transition = { JobStatus::Running, JobStatus::Running, false },
    pending_to_completed_skips_running = { JobStatus::Pending, JobStatus::Completed, false },
    completed_to_running_reopens_a_terminal_job = { JobStatus::Completed, JobStatus::Running, false },
    failed_to_completed_reopens_a_terminal_job = { JobStatus::Failed, JobStatus::Completed, false },
    cancelled_to_running_reopens_a_terminal_job = { JobStatus::Cancelled, JobStatus::Running, false },
)]
fn status_transitions_follow_the_state_machine(from: JobStatus, to: JobStatus, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[test]
fn terminal_states_are_final() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Cancelled.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
}

#[test]
fn progress_is_not_settled_with_zero_total() {
    let progress = Progress::default();
    assert!(!progress.is_settled());
}

#[test]
fn progress_settles_once_all_children_terminate() {
    let progress = Progress { total: 3, completed: 2, failed: 1, current: None };
    assert!(progress.is_settled());
}

#[test]
fn document_count_reads_from_metadata() {
    let mut job = JobBuilder::default().build();
    job.metadata.insert("document_count".to_string(), serde_json::json!(7));
    assert_eq!(job.document_count(), 7);
}

#[test]
fn document_count_defaults_to_zero() {
    let job = JobBuilder::default().build();
    assert_eq!(job.document_count(), 0);
}
