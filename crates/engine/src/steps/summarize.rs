// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SummarizeStepManager`: a parent with exactly one child carrying the
//! step's config as its payload.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use quaero_core::{Clock, JobDefinition, JobId, Step};

use super::StepManager;
use crate::error::EngineResult;
use crate::job_manager::JobManager;
use crate::monitor::JobMonitor;

pub struct SummarizeStepManager;

impl SummarizeStepManager {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SummarizeStepManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Clock> StepManager<C> for SummarizeStepManager {
    fn manager_type(&self) -> &'static str {
        "summarize"
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
            .create_parent_job("parent", Some("summarize".into()), Vec::new(), metadata, false)
            .await?;
        manager.create_child_job(&parent.id, "summarize_doc", step.config.clone()).await?;
        monitor.start_monitoring(parent.id);
        Ok(parent.id)
    }
}
