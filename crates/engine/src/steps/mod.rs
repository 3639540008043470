// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! StepManagers: per-action adapters that shape a [`Step`] into one parent
//! job plus its initial children. They do not execute work
//! themselves; that's the [`Worker`](quaero_core::Worker)'s job.

mod crawl;
mod maintenance;
mod summarize;
mod transform;

pub use crawl::CrawlStepManager;
pub use maintenance::MaintenanceStepManager;
pub use summarize::SummarizeStepManager;
pub use transform::TransformStepManager;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use quaero_core::{Clock, JobDefinition, JobId, Step};

use crate::error::EngineResult;
use crate::job_manager::JobManager;
use crate::monitor::JobMonitor;

/// Registry of StepManager plug-ins keyed by the action name they handle
/// (the same "mapping keyed by type name" pattern as
/// `WorkerRegistry`).
pub type StepManagerRegistry<C> = HashMap<String, Arc<dyn StepManager<C>>>;

/// One manager per `action` type.
#[async_trait]
pub trait StepManager<C: Clock>: Send + Sync {
    /// The action name this manager handles.
    fn manager_type(&self) -> &'static str;

    /// Materialize `step` as one parent job and its initial children,
    /// enqueue the children, and start monitoring if the parent spawned
    /// any. Returns the step's parent job id.
    async fn create_parent_job(
        &self,
        step: &Step,
        definition: &JobDefinition,
        top_parent_id: JobId,
        manager: &JobManager<C>,
        monitor: &JobMonitor<C>,
    ) -> EngineResult<JobId>;
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
