// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Queue` trait: at-least-once durable delivery with visibility
//! timeout and a redelivery limit.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use quaero_core::JobId;

use crate::error::QueueResult;
use crate::message::{MessageHandle, QueueMessage};

/// Outcome of a `receive` call that raced a cancellation.
pub enum Received {
    Message(QueueMessage, MessageHandle),
    Cancelled,
}

#[async_trait]
pub trait Queue: Send + Sync {
    /// Persist `message`, optionally invisible until `delay` elapses.
    async fn enqueue(
        &self,
        job_id: JobId,
        job_type: String,
        payload: Vec<u8>,
        delay: Option<Duration>,
    ) -> QueueResult<()>;

    /// Block until a message is visible or `cancel` fires. Marks the
    /// returned message invisible for `visibility_timeout`.
    async fn receive(
        &self,
        visibility_timeout: Duration,
        cancel: &CancellationToken,
    ) -> QueueResult<Received>;

    /// Long-running workers call this to push the visibility deadline out
    /// further without finishing the message.
    async fn extend(&self, handle: &MessageHandle, new_timeout: Duration) -> QueueResult<()>;

    /// Remove a message after successful processing.
    async fn delete(&self, handle: &MessageHandle) -> QueueResult<()>;
}
