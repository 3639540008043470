// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process `Queue` backend.
//!
//! A single `parking_lot::Mutex`-guarded vector plus a `tokio::sync::Notify`
//! for wakeups: shared resources behind a mutex, no lock-free structures.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use quaero_core::JobId;

use crate::error::{QueueError, QueueResult};
use crate::message::{MessageHandle, QueueMessage};
use crate::queue::{Queue, Received};

struct Entry {
    job_id: JobId,
    job_type: String,
    payload: Vec<u8>,
    visible_at: Instant,
    delivery_count: u32,
}

struct State {
    entries: HashMap<u64, Entry>,
    next_handle: u64,
    dead_letters: Vec<JobId>,
}

pub struct MemoryQueue {
    redelivery_limit: u32,
    state: Mutex<State>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new(redelivery_limit: u32) -> Self {
        Self {
            redelivery_limit,
            state: Mutex::new(State {
                entries: HashMap::new(),
                next_handle: 0,
                dead_letters: Vec::new(),
            }),
            notify: Notify::new(),
        }
    }

    /// Messages dropped after exceeding the redelivery limit, drained by
    /// the worker pool's reaper task.
    pub fn drain_dead_letters(&self) -> Vec<JobId> {
        std::mem::take(&mut self.state.lock().dead_letters)
    }

    /// Pop the next visible entry, if any, promoting exhausted redeliveries
    /// to dead letters along the way.
    fn try_take_visible(&self, visibility_timeout: Duration) -> Option<(u64, QueueMessage)> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let ready_handle = state
            .entries
            .iter()
            .filter(|(_, e)| e.visible_at <= now)
            .min_by_key(|(_, e)| e.visible_at)
            .map(|(h, _)| *h);

        let handle = ready_handle?;
        let entry = state.entries.get_mut(&handle)?;
        entry.delivery_count += 1;
        if entry.delivery_count > self.redelivery_limit {
            let job_id = entry.job_id;
            state.entries.remove(&handle);
            state.dead_letters.push(job_id);
            drop(state);
            tracing::warn!(%job_id, "message exceeded redelivery limit, dead-lettered");
            return self.try_take_visible(visibility_timeout);
        }
        entry.visible_at = now + visibility_timeout;
        let message = QueueMessage {
            job_id: entry.job_id,
            job_type: entry.job_type.clone(),
            payload: entry.payload.clone(),
            delivery_count: entry.delivery_count,
        };
        Some((handle, message))
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn enqueue(
        &self,
        job_id: JobId,
        job_type: String,
        payload: Vec<u8>,
        delay: Option<Duration>,
    ) -> QueueResult<()> {
        let visible_at = Instant::now() + delay.unwrap_or_default();
        {
            let mut state = self.state.lock();
            let handle = state.next_handle;
            state.next_handle += 1;
            state.entries.insert(
                handle,
                Entry { job_id, job_type, payload, visible_at, delivery_count: 0 },
            );
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn receive(
        &self,
        visibility_timeout: Duration,
        cancel: &CancellationToken,
    ) -> QueueResult<Received> {
        loop {
            if let Some((handle, message)) = self.try_take_visible(visibility_timeout) {
                return Ok(Received::Message(message, MessageHandle::new(handle.to_string())));
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(Received::Cancelled),
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        }
    }

    async fn extend(&self, handle: &MessageHandle, new_timeout: Duration) -> QueueResult<()> {
        let id: u64 = handle.as_str().parse().map_err(|_| QueueError::HandleNotFound(handle.0.clone()))?;
        let mut state = self.state.lock();
        let entry = state.entries.get_mut(&id).ok_or_else(|| QueueError::HandleNotFound(handle.0.clone()))?;
        entry.visible_at = Instant::now() + new_timeout;
        Ok(())
    }

    async fn delete(&self, handle: &MessageHandle) -> QueueResult<()> {
        let id: u64 = handle.as_str().parse().map_err(|_| QueueError::HandleNotFound(handle.0.clone()))?;
        let mut state = self.state.lock();
        state.entries.remove(&id).ok_or_else(|| QueueError::HandleNotFound(handle.0.clone()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
