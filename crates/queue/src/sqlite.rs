// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed `Queue`.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tokio_util::sync::CancellationToken;

use quaero_core::JobId;

use crate::error::{QueueError, QueueResult};
use crate::message::{MessageHandle, QueueMessage};
use crate::queue::{Queue, Received};

pub struct SqliteQueue {
    pool: SqlitePool,
    redelivery_limit: u32,
}

impl SqliteQueue {
    pub fn new(pool: SqlitePool, redelivery_limit: u32) -> Self {
        Self { pool, redelivery_limit }
    }

    pub async fn migrate(&self) -> QueueResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| QueueError::Backend(sqlx::Error::Migrate(Box::new(e))))
    }

    /// Drain messages that exceeded the redelivery limit, moving them out
    /// of the table and returning their job ids.
    pub async fn drain_dead_letters(&self) -> QueueResult<Vec<JobId>> {
        let rows = sqlx::query("SELECT handle, job_id FROM queue_messages WHERE delivery_count > ?")
            .bind(self.redelivery_limit as i64)
            .fetch_all(&self.pool)
            .await?;
        let mut job_ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let handle: String = row.try_get("handle")?;
            let job_id: String = row.try_get("job_id")?;
            sqlx::query("DELETE FROM queue_messages WHERE handle = ?")
                .bind(&handle)
                .execute(&self.pool)
                .await?;
            job_ids.push(JobId::from_string(job_id));
        }
        Ok(job_ids)
    }
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[async_trait]
impl Queue for SqliteQueue {
    async fn enqueue(
        &self,
        job_id: JobId,
        job_type: String,
        payload: Vec<u8>,
        delay: Option<Duration>,
    ) -> QueueResult<()> {
        let handle = nanoid::nanoid!();
        let visible_at = now_ms() + delay.map(|d| d.as_millis() as i64).unwrap_or(0);
        sqlx::query(
            "INSERT INTO queue_messages (handle, job_id, job_type, payload, visible_at, \
             delivery_count, enqueued_at) VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(&handle)
        .bind(job_id.as_str())
        .bind(&job_type)
        .bind(&payload)
        .bind(visible_at)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn receive(
        &self,
        visibility_timeout: Duration,
        cancel: &CancellationToken,
    ) -> QueueResult<Received> {
        loop {
            let now = now_ms();
            let row = sqlx::query(
                "SELECT handle, job_id, job_type, payload, delivery_count FROM queue_messages \
                 WHERE visible_at <= ? ORDER BY visible_at ASC LIMIT 1",
            )
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = row {
                let handle: String = row.try_get("handle")?;
                let delivery_count: i64 = row.try_get("delivery_count")?;
                let new_count = delivery_count + 1;

                if new_count as u32 > self.redelivery_limit {
                    // Push visible_at to the far future so this poll loop
                    // doesn't spin on it; drain_dead_letters still finds it
                    // by delivery_count and removes it for good.
                    sqlx::query(
                        "UPDATE queue_messages SET delivery_count = ?, visible_at = ? WHERE handle = ?",
                    )
                    .bind(new_count)
                    .bind(i64::MAX)
                    .bind(&handle)
                    .execute(&self.pool)
                    .await?;
                    tracing::warn!(handle = %handle, "message exceeded redelivery limit, dead-lettered");
                    continue;
                }

                let job_id: String = row.try_get("job_id")?;
                let job_type: String = row.try_get("job_type")?;
                let payload: Vec<u8> = row.try_get("payload")?;
                let new_visible_at = now + visibility_timeout.as_millis() as i64;
                sqlx::query(
                    "UPDATE queue_messages SET delivery_count = ?, visible_at = ? WHERE handle = ?",
                )
                .bind(new_count)
                .bind(new_visible_at)
                .bind(&handle)
                .execute(&self.pool)
                .await?;

                return Ok(Received::Message(
                    QueueMessage {
                        job_id: JobId::from_string(job_id),
                        job_type,
                        payload,
                        delivery_count: new_count as u32,
                    },
                    MessageHandle::new(handle),
                ));
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(Received::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        }
    }

    async fn extend(&self, handle: &MessageHandle, new_timeout: Duration) -> QueueResult<()> {
        let new_visible_at = now_ms() + new_timeout.as_millis() as i64;
        let result = sqlx::query("UPDATE queue_messages SET visible_at = ? WHERE handle = ?")
            .bind(new_visible_at)
            .bind(handle.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(QueueError::HandleNotFound(handle.0.clone()));
        }
        Ok(())
    }

    async fn delete(&self, handle: &MessageHandle) -> QueueResult<()> {
        let result = sqlx::query("DELETE FROM queue_messages WHERE handle = ?")
            .bind(handle.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(QueueError::HandleNotFound(handle.0.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
