// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use quaero_core::JobBuilder;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::tempdir;

async fn new_store() -> SqliteJobStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
    let store = SqliteJobStore::new(pool);
    store.migrate().await.unwrap();
    store
}

fn parent() -> Job {
    JobBuilder::new().job_type("parent").build()
}

fn child(parent_id: JobId) -> Job {
    JobBuilder::new().job_type("crawler_url").parent_id(parent_id).build()
}

#[tokio::test]
async fn create_and_get_round_trips() {
    let store = new_store().await;
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    let fetched = store.get_job(&id).await.unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.job_type, "parent");
}

#[tokio::test]
async fn create_rejects_duplicate_id() {
    let store = new_store().await;
    let job = parent();
    store.create_job(job.clone()).await.unwrap();
    assert!(matches!(store.create_job(job).await, Err(StoreError::AlreadyExists(_))));
}

#[tokio::test]
async fn status_transition_enforces_state_machine() {
    let store = new_store().await;
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.update_job_status(&id, JobStatus::Running, None, 10).await.unwrap();
    let err = store.update_job_status(&id, JobStatus::Pending, None, 20).await;
    assert!(matches!(err, Err(StoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn cascade_delete_removes_children_via_foreign_key() {
    let store = new_store().await;
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    let c = child(pid);
    let cid = c.id;
    store.create_job(c).await.unwrap();
    store.append_job_log(&cid, LogLevel::Info, "hi".into(), 1).await.unwrap();

    store.delete_job(&pid).await.unwrap();

    assert!(matches!(store.get_job(&pid).await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.get_job(&cid).await, Err(StoreError::NotFound(_))));
    let logs = store.get_job_logs(&cid, LogFilter::default()).await.unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn child_stats_batches_across_parents() {
    let store = new_store().await;
    let p1 = parent();
    let p1id = p1.id;
    let p2 = parent();
    let p2id = p2.id;
    store.create_job(p1).await.unwrap();
    store.create_job(p2).await.unwrap();
    let c1 = child(p1id);
    let c1id = c1.id;
    store.create_job(c1).await.unwrap();
    store.update_job_status(&c1id, JobStatus::Running, None, 1).await.unwrap();
    store.update_job_status(&c1id, JobStatus::Completed, None, 2).await.unwrap();

    let stats = store.get_child_stats(&[p1id, p2id]).await.unwrap();
    assert_eq!(stats[&p1id].completed_children, 1);
    assert_eq!(stats[&p2id].child_count, 0);
}

#[tokio::test]
async fn list_jobs_filters_by_status_and_type() {
    let store = new_store().await;
    let p = parent();
    let pid = p.id;
    store.create_job(p).await.unwrap();
    let c = child(pid);
    let cid = c.id;
    store.create_job(c).await.unwrap();
    store.update_job_status(&cid, JobStatus::Running, None, 1).await.unwrap();

    let running = store
        .list_jobs(ListJobsFilter::new().status(JobStatus::Running).job_type("crawler_url"))
        .await
        .unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, cid);
}

#[tokio::test]
async fn update_job_result_persists_across_reads() {
    let store = new_store().await;
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.update_job_result(&id, Some(vec![9, 8, 7])).await.unwrap();
    assert_eq!(store.get_job(&id).await.unwrap().result, Some(vec![9, 8, 7]));
}

#[tokio::test]
async fn increment_progress_total_persists_across_reads() {
    let store = new_store().await;
    let job = parent();
    let id = job.id;
    store.create_job(job).await.unwrap();
    store.increment_progress_total(&id).await.unwrap();
    store.increment_progress_total(&id).await.unwrap();
    store.increment_progress_total(&id).await.unwrap();
    assert_eq!(store.get_job(&id).await.unwrap().progress.total, 3);
}

#[tokio::test]
async fn jobs_survive_a_reopen_of_the_on_disk_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.sqlite3");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let id = {
        let pool = SqlitePoolOptions::new().max_connections(1).connect(&url).await.unwrap();
        let store = SqliteJobStore::new(pool);
        store.migrate().await.unwrap();
        let job = parent();
        let id = job.id;
        store.create_job(job).await.unwrap();
        store.update_job_status(&id, JobStatus::Running, None, 1).await.unwrap();
        id
    };

    let pool = SqlitePoolOptions::new().max_connections(1).connect(&url).await.unwrap();
    let reopened = SqliteJobStore::new(pool);
    let job = reopened.get_job(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Running);
}
