// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quaero-queue: at-least-once durable delivery with visibility timeout and
//! a redelivery limit, backed by either SQLite or an
//! in-process implementation.

mod error;
mod memory;
mod message;
mod queue;
mod sqlite;

pub use error::{QueueError, QueueResult};
pub use memory::MemoryQueue;
pub use message::{MessageHandle, QueueMessage};
pub use queue::{Queue, Received};
pub use sqlite::SqliteQueue;
