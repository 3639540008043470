// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the durable queue.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("message handle not found or already deleted: {0}")]
    HandleNotFound(String),

    #[error("queue backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;
