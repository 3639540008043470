// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed `JobStore`, the relational-store backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use quaero_core::config::CONTENTION_BACKOFF_MS;
use quaero_core::{Job, JobId, JobLogEntry, JobStatus, LogLevel, LogOrder, Progress};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;
use crate::types::{ChildStats, ListJobsFilter, LogFilter, ROOT_PARENT};

pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run `migrations/` against the pool. Call once at startup.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| {
            StoreError::Backend(sqlx::Error::Migrate(Box::new(e)))
        })
    }

    /// Retry `f` on a `sqlx::Error` that looks like write contention
    /// (SQLITE_BUSY/SQLITE_LOCKED), following the configured backoff ladder.
    /// `CONTENTION_BACKOFF_MS.len()` bounds the attempt count (5), not just
    /// the number of sleeps, so the last entry is the final attempt rather
    /// than a sleep followed by one more try.
    async fn with_contention_retry<T, F, Fut>(&self, id: JobId, mut f: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        let mut last_err = None;
        for (attempt, delay_ms) in CONTENTION_BACKOFF_MS.into_iter().enumerate() {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) if is_contention(&e) => {
                    last_err = Some(e);
                    if attempt + 1 == CONTENTION_BACKOFF_MS.len() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(StoreError::Backend(e)),
            }
        }
        tracing::warn!(job_id = %id, error = ?last_err, "store contention exhausted");
        Err(StoreError::Contention(id))
    }
}

fn is_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5") | Some("6"))
        }
        _ => false,
    }
}

struct JobRow {
    id: String,
    parent_id: String,
    job_type: String,
    action: Option<String>,
    status: String,
    payload: Vec<u8>,
    result: Option<Vec<u8>>,
    error: Option<String>,
    created_at: i64,
    started_at: Option<i64>,
    completed_at: Option<i64>,
    progress_json: String,
    metadata_json: String,
}

impl JobRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            parent_id: row.try_get("parent_id")?,
            job_type: row.try_get("type")?,
            action: row.try_get("action")?,
            status: row.try_get("status")?,
            payload: row.try_get("payload")?,
            result: row.try_get("result")?,
            error: row.try_get("error")?,
            created_at: row.try_get("created_at")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
            progress_json: row.try_get("progress_json")?,
            metadata_json: row.try_get("metadata_json")?,
        })
    }

    fn into_job(self) -> StoreResult<Job> {
        Ok(Job {
            id: JobId::from_string(&self.id),
            parent_id: JobId::from_string(&self.parent_id),
            job_type: self.job_type,
            action: self.action,
            status: parse_status(&self.status),
            payload: self.payload,
            result: self.result,
            error: self.error,
            created_at_epoch_ms: self.created_at as u64,
            started_at_epoch_ms: self.started_at.map(|v| v as u64),
            completed_at_epoch_ms: self.completed_at.map(|v| v as u64),
            progress: serde_json::from_str(&self.progress_json)?,
            metadata: serde_json::from_str(&self.metadata_json)?,
        })
    }
}

fn status_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

fn parse_status(s: &str) -> JobStatus {
    match s {
        "running" => JobStatus::Running,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        "cancelled" => JobStatus::Cancelled,
        _ => JobStatus::Pending,
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create_job(&self, job: Job) -> StoreResult<()> {
        let progress_json = serde_json::to_string(&job.progress)?;
        let metadata_json = serde_json::to_string(&job.metadata)?;
        let result = sqlx::query(
            "INSERT INTO jobs (id, parent_id, type, action, status, payload, result, error, \
             created_at, started_at, completed_at, progress_json, metadata_json) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.as_str())
        .bind(job.parent_id.as_str())
        .bind(&job.job_type)
        .bind(&job.action)
        .bind(status_str(job.status))
        .bind(&job.payload)
        .bind(&job.result)
        .bind(&job.error)
        .bind(job.created_at_epoch_ms as i64)
        .bind(job.started_at_epoch_ms.map(|v| v as i64))
        .bind(job.completed_at_epoch_ms.map(|v| v as i64))
        .bind(&progress_json)
        .bind(&metadata_json)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::AlreadyExists(job.id))
            }
            Err(e) => Err(StoreError::Backend(e)),
        }
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Job> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Backend)?
            .ok_or(StoreError::NotFound(*id))?;
        JobRow::from_row(&row).map_err(StoreError::Backend)?.into_job()
    }

    async fn update_job_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error: Option<String>,
        now_epoch_ms: u64,
    ) -> StoreResult<()> {
        let current = self.get_job(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: current.status.to_string(),
                to: status.to_string(),
            });
        }
        let started_at = if status == JobStatus::Running {
            Some(now_epoch_ms as i64)
        } else {
            current.started_at_epoch_ms.map(|v| v as i64)
        };
        let completed_at = if status.is_terminal() { Some(now_epoch_ms as i64) } else { None };

        self.with_contention_retry(*id, || async {
            sqlx::query(
                "UPDATE jobs SET status = ?, error = ?, started_at = ?, completed_at = ? WHERE id = ?",
            )
            .bind(status_str(status))
            .bind(&error)
            .bind(started_at)
            .bind(completed_at)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
        })
        .await?;
        Ok(())
    }

    async fn update_job_progress(&self, id: &JobId, progress: Progress) -> StoreResult<()> {
        let progress_json = serde_json::to_string(&progress)?;
        self.with_contention_retry(*id, || async {
            sqlx::query("UPDATE jobs SET progress_json = ? WHERE id = ?")
                .bind(&progress_json)
                .bind(id.as_str())
                .execute(&self.pool)
                .await
        })
        .await?;
        Ok(())
    }

    /// Reads and writes `metadata_json` inside one SQLite transaction so a
    /// concurrent merge can't read-modify-write on a stale value: whichever
    /// writer's `UPDATE` loses the race gets `SQLITE_BUSY`, rolls back (via
    /// `Transaction`'s drop), and `with_contention_retry` restarts the whole
    /// read-merge-write cycle against the now-current row.
    async fn update_job_metadata(
        &self,
        id: &JobId,
        merge: HashMap<String, Value>,
    ) -> StoreResult<()> {
        self.get_job(id).await?;
        self.with_contention_retry(*id, || async {
            let mut tx = self.pool.begin().await?;
            let row = sqlx::query("SELECT metadata_json FROM jobs WHERE id = ?")
                .bind(id.as_str())
                .fetch_one(&mut *tx)
                .await?;
            let metadata_json: String = row.try_get("metadata_json")?;
            let mut metadata: HashMap<String, Value> = serde_json::from_str(&metadata_json)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            metadata.extend(merge.clone());
            let merged_json =
                serde_json::to_string(&metadata).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
            sqlx::query("UPDATE jobs SET metadata_json = ? WHERE id = ?")
                .bind(&merged_json)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await?;
            tx.commit().await
        })
        .await?;
        Ok(())
    }

    /// Single atomic statement via SQLite's JSON1 functions, rather than a
    /// separate read followed by a write: two workers discovering documents
    /// under the same parent concurrently each increment the stored value
    /// directly instead of racing on a cached copy.
    async fn increment_document_count(&self, id: &JobId) -> StoreResult<()> {
        self.get_job(id).await?;
        self.with_contention_retry(*id, || async {
            sqlx::query(
                "UPDATE jobs SET metadata_json = json_set(metadata_json, '$.document_count', \
                 COALESCE(json_extract(metadata_json, '$.document_count'), 0) + 1) WHERE id = ?",
            )
            .bind(id.as_str())
            .execute(&self.pool)
            .await
        })
        .await?;
        Ok(())
    }

    async fn update_job_result(&self, id: &JobId, result: Option<Vec<u8>>) -> StoreResult<()> {
        self.with_contention_retry(*id, || async {
            sqlx::query("UPDATE jobs SET result = ? WHERE id = ?")
                .bind(&result)
                .bind(id.as_str())
                .execute(&self.pool)
                .await
        })
        .await?;
        Ok(())
    }

    async fn increment_progress_total(&self, parent_id: &JobId) -> StoreResult<()> {
        self.get_job(parent_id).await?;
        self.with_contention_retry(*parent_id, || async {
            sqlx::query(
                "UPDATE jobs SET progress_json = json_set(progress_json, '$.total', \
                 json_extract(progress_json, '$.total') + 1) WHERE id = ?",
            )
            .bind(parent_id.as_str())
            .execute(&self.pool)
            .await
        })
        .await?;
        Ok(())
    }

    async fn list_jobs(&self, filter: ListJobsFilter) -> StoreResult<Vec<Job>> {
        let mut sql = "SELECT * FROM jobs WHERE 1=1".to_string();
        if let Some(p) = &filter.parent_id {
            if p == ROOT_PARENT {
                sql.push_str(" AND parent_id = ''");
            } else {
                sql.push_str(" AND parent_id = ?");
            }
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.job_type.is_some() {
            sql.push_str(" AND type = ?");
        }
        sql.push_str(" ORDER BY created_at ASC");
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }
        if filter.offset.is_some() {
            sql.push_str(" OFFSET ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(p) = &filter.parent_id {
            if p != ROOT_PARENT {
                query = query.bind(p.clone());
            }
        }
        if let Some(s) = filter.status {
            query = query.bind(status_str(s));
        }
        if let Some(t) = &filter.job_type {
            query = query.bind(t.clone());
        }
        if let Some(l) = filter.limit {
            query = query.bind(l as i64);
        }
        if let Some(o) = filter.offset {
            query = query.bind(o as i64);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(StoreError::Backend)?;
        rows.iter()
            .map(|r| JobRow::from_row(r).map_err(StoreError::Backend)?.into_job())
            .collect()
    }

    async fn get_child_jobs(&self, parent_id: &JobId) -> StoreResult<Vec<Job>> {
        let rows = sqlx::query("SELECT * FROM jobs WHERE parent_id = ? ORDER BY created_at ASC")
            .bind(parent_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Backend)?;
        rows.iter()
            .map(|r| JobRow::from_row(r).map_err(StoreError::Backend)?.into_job())
            .collect()
    }

    async fn get_child_stats(
        &self,
        parent_ids: &[JobId],
    ) -> StoreResult<HashMap<JobId, ChildStats>> {
        let mut stats: HashMap<JobId, ChildStats> =
            parent_ids.iter().map(|id| (*id, ChildStats::default())).collect();
        if parent_ids.is_empty() {
            return Ok(stats);
        }
        let placeholders = parent_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT parent_id, status, COUNT(*) as n FROM jobs WHERE parent_id IN ({placeholders}) \
             GROUP BY parent_id, status"
        );
        let mut query = sqlx::query(&sql);
        for id in parent_ids {
            query = query.bind(id.as_str());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(StoreError::Backend)?;
        for row in rows {
            let parent_id: String = row.try_get("parent_id").map_err(StoreError::Backend)?;
            let status: String = row.try_get("status").map_err(StoreError::Backend)?;
            let n: i64 = row.try_get("n").map_err(StoreError::Backend)?;
            let id = JobId::from_string(&parent_id);
            if let Some(entry) = stats.get_mut(&id) {
                entry.child_count += n as u64;
                match parse_status(&status) {
                    JobStatus::Completed => entry.completed_children += n as u64,
                    JobStatus::Failed => entry.failed_children += n as u64,
                    _ => {}
                }
            }
        }
        Ok(stats)
    }

    async fn delete_job(&self, id: &JobId) -> StoreResult<()> {
        self.get_job(id).await?;
        // ON DELETE CASCADE handles children and logs at the schema level;
        // the single statement below removes the parent and everything
        // beneath it in one transaction.
        self.with_contention_retry(*id, || async {
            sqlx::query("DELETE FROM jobs WHERE id = ?").bind(id.as_str()).execute(&self.pool).await
        })
        .await?;
        Ok(())
    }

    async fn append_job_log(
        &self,
        id: &JobId,
        level: LogLevel,
        message: String,
        now_epoch_ms: u64,
    ) -> StoreResult<()> {
        self.get_job(id).await?;
        sqlx::query("INSERT INTO job_logs (job_id, level, message, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.as_str())
            .bind(level.to_string())
            .bind(message)
            .bind(now_epoch_ms as i64)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Backend)?;
        Ok(())
    }

    async fn get_job_logs(&self, id: &JobId, filter: LogFilter) -> StoreResult<Vec<JobLogEntry>> {
        let rows = sqlx::query("SELECT job_id, level, message, created_at FROM job_logs WHERE job_id = ?")
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Backend)?;
        Ok(apply_log_filter(rows_to_logs(&rows)?, filter))
    }

    async fn get_aggregated_job_logs(
        &self,
        parent_id: &JobId,
        filter: LogFilter,
    ) -> StoreResult<Vec<JobLogEntry>> {
        let rows = sqlx::query(
            "SELECT job_id, level, message, created_at FROM job_logs \
             WHERE job_id = ? OR job_id IN (SELECT id FROM jobs WHERE parent_id = ?)",
        )
        .bind(parent_id.as_str())
        .bind(parent_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Backend)?;
        Ok(apply_log_filter(rows_to_logs(&rows)?, filter))
    }
}

fn rows_to_logs(rows: &[sqlx::sqlite::SqliteRow]) -> StoreResult<Vec<JobLogEntry>> {
    rows.iter()
        .map(|row| {
            let job_id: String = row.try_get("job_id").map_err(StoreError::Backend)?;
            let level: String = row.try_get("level").map_err(StoreError::Backend)?;
            let message: String = row.try_get("message").map_err(StoreError::Backend)?;
            let created_at: i64 = row.try_get("created_at").map_err(StoreError::Backend)?;
            Ok(JobLogEntry {
                job_id: JobId::from_string(&job_id),
                level: parse_level(&level),
                message,
                timestamp_epoch_ms: created_at as u64,
            })
        })
        .collect()
}

fn parse_level(s: &str) -> LogLevel {
    match s {
        "warn" => LogLevel::Warn,
        "info" => LogLevel::Info,
        "debug" => LogLevel::Debug,
        _ => LogLevel::Error,
    }
}

fn apply_log_filter(mut entries: Vec<JobLogEntry>, filter: LogFilter) -> Vec<JobLogEntry> {
    entries.sort_by_key(|e| e.timestamp_epoch_ms);
    if filter.order == LogOrder::Descending {
        entries.reverse();
    }
    let entries = entries.into_iter().filter(|e| filter.level.map(|l| l == e.level).unwrap_or(true));
    match filter.limit {
        Some(limit) => entries.take(limit as usize).collect(),
        None => entries.collect(),
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
