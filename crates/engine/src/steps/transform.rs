// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TransformStepManager`: a parent with exactly one child carrying the
//! step's config as its payload. Covers both `transform`
//! and `reindex` actions, which share the same one-child shape.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use quaero_core::{Clock, JobDefinition, JobId, Step};

use super::StepManager;
use crate::error::EngineResult;
use crate::job_manager::JobManager;
use crate::monitor::JobMonitor;

pub struct TransformStepManager {
    action: &'static str,
    child_job_type: &'static str,
}

impl TransformStepManager {
    pub fn new() -> Self {
        Self { action: "transform", child_job_type: "transform_doc" }
    }

    /// A `reindex` step shares `transform`'s shape but
    /// dispatches its child to a differently-registered worker.
    pub fn reindex() -> Self {
        Self { action: "reindex", child_job_type: "reindex_doc" }
    }
}

impl Default for TransformStepManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Clock> StepManager<C> for TransformStepManager {
    fn manager_type(&self) -> &'static str {
        self.action
    }

    async fn create_parent_job(
        &self,
        step: &Step,
        definition: &JobDefinition,
        top_parent_id: JobId,
        manager: &JobManager<C>,
        monitor: &JobMonitor<C>,
    ) -> EngineResult<JobId> {
        let mut metadata = HashMap::new();
        metadata.insert("job_definition_id".to_string(), json!(definition.id.as_str()));
        metadata.insert("top_parent_id".to_string(), json!(top_parent_id.as_str()));
        metadata.insert("step_name".to_string(), json!(step.name));

        let parent = manager
            .create_parent_job("parent", Some(self.action.into()), Vec::new(), metadata, false)
            .await?;
        manager.create_child_job(&parent.id, self.child_job_type, step.config.clone()).await?;
        monitor.start_monitoring(parent.id);
        Ok(parent.id)
    }
}
