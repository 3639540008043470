// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query parameter and result types shared by every [`crate::JobStore`]
//! backend.

use quaero_core::{JobStatus, LogOrder};

/// Distinguished `parent_id` value meaning "parent jobs only" in
/// [`ListJobsFilter`].
pub const ROOT_PARENT: &str = "root";

#[derive(Debug, Clone, Default)]
pub struct ListJobsFilter {
    pub parent_id: Option<String>,
    pub status: Option<JobStatus>,
    pub job_type: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListJobsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn root_only(mut self) -> Self {
        self.parent_id = Some(ROOT_PARENT.to_string());
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Aggregate child counters for one parent, as returned in bulk by
/// `GetChildStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildStats {
    pub child_count: u64,
    pub completed_children: u64,
    pub failed_children: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogFilter {
    pub level: Option<quaero_core::LogLevel>,
    pub limit: Option<u64>,
    pub order: LogOrder,
}
