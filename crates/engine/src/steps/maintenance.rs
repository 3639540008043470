// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MaintenanceStepManager`: no fan-out expected, so the parent is created
//! and enqueued directly; the `WorkerPool` settles it like any other
//! single job.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use quaero_core::{Clock, JobDefinition, JobId, Step};

use super::StepManager;
use crate::error::EngineResult;
use crate::job_manager::JobManager;
use crate::monitor::JobMonitor;

pub struct MaintenanceStepManager;

impl MaintenanceStepManager {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MaintenanceStepManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Clock> StepManager<C> for MaintenanceStepManager {
    fn manager_type(&self) -> &'static str {
        "maintenance"
    }

    async fn create_parent_job(
        &self,
        step: &Step,
        definition: &JobDefinition,
        top_parent_id: JobId,
        manager: &JobManager<C>,
        _monitor: &JobMonitor<C>,
    ) -> EngineResult<JobId> {
        let mut metadata = HashMap::new();
        metadata.insert("job_definition_id".to_string(), json!(definition.id.as_str()));
        metadata.insert("top_parent_id".to_string(), json!(top_parent_id.as_str()));
        metadata.insert("step_name".to_string(), json!(step.name));

        let parent = manager
            .create_parent_job("maintenance", Some("maintenance".into()), step.config.clone(), metadata, true)
            .await?;
        Ok(parent.id)
    }
}
