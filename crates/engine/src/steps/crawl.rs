// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CrawlStepManager`: fans a step's `config` (seed URLs) out into one
//! `crawler_url` child per seed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use quaero_core::{Clock, JobDefinition, JobId, Step};

use super::StepManager;
use crate::error::{EngineError, EngineResult};
use crate::job_manager::JobManager;
use crate::monitor::JobMonitor;

#[derive(Debug, Deserialize)]
struct CrawlConfig {
    seed_urls: Vec<String>,
}

pub struct CrawlStepManager;

impl CrawlStepManager {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CrawlStepManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Clock> StepManager<C> for CrawlStepManager {
    fn manager_type(&self) -> &'static str {
        "crawl"
    }

    async fn create_parent_job(
        &self,
        step: &Step,
        definition: &JobDefinition,
        top_parent_id: JobId,
        manager: &JobManager<C>,
        monitor: &JobMonitor<C>,
    ) -> EngineResult<JobId> {
        let config: CrawlConfig = serde_json::from_slice(&step.config)
            .map_err(|e| EngineError::InvalidStepConfig(step.name.clone(), e.to_string()))?;

        let mut metadata = HashMap::new();
        metadata.insert("job_definition_id".to_string(), json!(definition.id.as_str()));
        metadata.insert("top_parent_id".to_string(), json!(top_parent_id.as_str()));
        metadata.insert("step_name".to_string(), json!(step.name));

        let parent = manager
            .create_parent_job("parent", Some("crawl".into()), Vec::new(), metadata, false)
            .await?;

        for seed_url in &config.seed_urls {
            manager.create_child_job(&parent.id, "crawler_url", seed_url.clone().into_bytes()).await?;
        }

        if !config.seed_urls.is_empty() {
            monitor.start_monitoring(parent.id);
        }

        Ok(parent.id)
    }
}
