// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use quaero_core::JobBuilder;

fn parent() -> Job {
    JobBuilder::new().job_type("parent").build()
}

fn child(parent_id: JobId) -> Job {
    JobBuilder::new().job_type("crawler_url").parent_id(parent_id).build()
}

#[tokio::test]
async fn create_and_get_round_trips() {
    let store = MemoryJobStore::new();
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    let fetched = store.get_job(&id).await.unwrap();
    assert_eq!(fetched.id, id);
}

#[tokio::test]
async fn create_rejects_duplicate_id() {
    let store = MemoryJobStore::new();
    let job = parent();
    store.create_job(job.clone()).await.unwrap();
    assert!(matches!(store.create_job(job).await, Err(StoreError::AlreadyExists(_))));
}

#[tokio::test]
async fn get_missing_job_is_not_found() {
    let store = MemoryJobStore::new();
    assert!(matches!(store.get_job(&JobId::new()).await, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn status_transition_enforces_state_machine() {
    let store = MemoryJobStore::new();
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.update_job_status(&id, JobStatus::Running, None, 10).await.unwrap();
    let err = store.update_job_status(&id, JobStatus::Pending, None, 20).await;
    assert!(matches!(err, Err(StoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn terminal_status_records_completed_at() {
    let store = MemoryJobStore::new();
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.update_job_status(&id, JobStatus::Running, None, 10).await.unwrap();
    store.update_job_status(&id, JobStatus::Completed, None, 20).await.unwrap();
    let fetched = store.get_job(&id).await.unwrap();
    assert_eq!(fetched.completed_at_epoch_ms, Some(20));
}

#[tokio::test]
async fn increment_document_count_starts_from_zero() {
    let store = MemoryJobStore::new();
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.increment_document_count(&id).await.unwrap();
    store.increment_document_count(&id).await.unwrap();
    assert_eq!(store.get_job(&id).await.unwrap().document_count(), 2);
}

#[tokio::test]
async fn update_job_result_sets_result_bytes() {
    let store = MemoryJobStore::new();
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.update_job_result(&id, Some(vec![1, 2, 3])).await.unwrap();
    assert_eq!(store.get_job(&id).await.unwrap().result, Some(vec![1, 2, 3]));
}

#[tokio::test]
async fn increment_progress_total_bumps_total_only() {
    let store = MemoryJobStore::new();
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.increment_progress_total(&id).await.unwrap();
    store.increment_progress_total(&id).await.unwrap();
    let fetched = store.get_job(&id).await.unwrap();
    assert_eq!(fetched.progress.total, 2);
    assert_eq!(fetched.progress.completed, 0);
}

#[tokio::test]
async fn list_jobs_root_only_excludes_children() {
    let store = MemoryJobStore::new();
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    store.create_job(child(pid)).await.unwrap();

    let roots = store.list_jobs(ListJobsFilter::new().root_only()).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, pid);
}

#[tokio::test]
async fn get_child_jobs_returns_only_direct_children() {
    let store = MemoryJobStore::new();
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    store.create_job(child(pid)).await.unwrap();
    store.create_job(child(pid)).await.unwrap();

    let children = store.get_child_jobs(&pid).await.unwrap();
    assert_eq!(children.len(), 2);
}

#[tokio::test]
async fn child_stats_counts_completed_and_failed() {
    let store = MemoryJobStore::new();
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    let c1 = child(pid);
    let c1_id = c1.id;
    let c2 = child(pid);
    let c2_id = c2.id;
    store.create_job(c1).await.unwrap();
    store.create_job(c2).await.unwrap();
    store.update_job_status(&c1_id, JobStatus::Running, None, 1).await.unwrap();
    store.update_job_status(&c1_id, JobStatus::Completed, None, 2).await.unwrap();
    store.update_job_status(&c2_id, JobStatus::Running, None, 1).await.unwrap();
    store.update_job_status(&c2_id, JobStatus::Failed, Some("boom".into()), 2).await.unwrap();

    let stats = store.get_child_stats(&[pid]).await.unwrap();
    let entry = stats[&pid];
    assert_eq!(entry.child_count, 2);
    assert_eq!(entry.completed_children, 1);
    assert_eq!(entry.failed_children, 1);
}

#[tokio::test]
async fn cascade_delete_removes_children_and_logs() {
    let store = MemoryJobStore::new();
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    let c1 = child(pid);
    let c1_id = c1.id;
    store.create_job(c1).await.unwrap();
    store.append_job_log(&pid, LogLevel::Info, "parent log".into(), 1).await.unwrap();
    store.append_job_log(&c1_id, LogLevel::Error, "child log".into(), 2).await.unwrap();

    store.delete_job(&pid).await.unwrap();

    assert!(matches!(store.get_job(&pid).await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.get_job(&c1_id).await, Err(StoreError::NotFound(_))));
    let agg = store.get_aggregated_job_logs(&pid, LogFilter::default()).await.unwrap();
    assert!(agg.is_empty());
}

#[tokio::test]
async fn aggregated_logs_union_parent_and_children() {
    let store = MemoryJobStore::new();
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    let c1 = child(pid);
    let c1_id = c1.id;
    store.create_job(c1).await.unwrap();
    store.append_job_log(&pid, LogLevel::Info, "parent log".into(), 1).await.unwrap();
    store.append_job_log(&c1_id, LogLevel::Error, "child log".into(), 2).await.unwrap();

    let agg = store.get_aggregated_job_logs(&pid, LogFilter::default()).await.unwrap();
    assert_eq!(agg.len(), 2);
}

#[tokio::test]
async fn log_filter_respects_level_and_order() {
    let store = MemoryJobStore::new();
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    store.append_job_log(&pid, LogLevel::Info, "first".into(), 1).await.unwrap();
    store.append_job_log(&pid, LogLevel::Error, "second".into(), 2).await.unwrap();

    let errors_only =
        store.get_job_logs(&pid, LogFilter { level: Some(LogLevel::Error), ..Default::default() }).await.unwrap();
    assert_eq!(errors_only.len(), 1);
    assert_eq!(errors_only[0].message, "second");

    let descending =
        store.get_job_logs(&pid, LogFilter { order: LogOrder::Descending, ..Default::default() }).await.unwrap();
    assert_eq!(descending[0].message, "second");
}
