// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Orchestrator`: drives a [`JobDefinition`] to completion. The only
//! component allowed to settle the top-level parent directly; step-level
//! parents are settled by their [`JobMonitor`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use quaero_core::{Clock, JobDefinition, JobId, JobStatus, OnError, RetryFallback, Step};

use crate::error::{EngineError, EngineResult};
use crate::job_manager::JobManager;
use crate::monitor::JobMonitor;
use crate::steps::{StepManager, StepManagerRegistry};

/// Lower bound of the poll interval the orchestrator uses while waiting
/// for a step's parent to settle.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct Orchestrator<C: Clock> {
    manager: Arc<JobManager<C>>,
    monitor: Arc<JobMonitor<C>>,
    step_managers: StepManagerRegistry<C>,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(
        manager: Arc<JobManager<C>>,
        monitor: Arc<JobMonitor<C>>,
        step_managers: StepManagerRegistry<C>,
    ) -> Self {
        Self { manager, monitor, step_managers }
    }

    /// Drive `definition` to completion, returning the id of the top-level
    /// parent job it created.
    pub async fn execute(&self, definition: JobDefinition, cancel: &CancellationToken) -> EngineResult<JobId> {
        definition.validate()?;

        let mut metadata = HashMap::new();
        metadata.insert("job_definition_id".to_string(), json!(definition.id.as_str()));
        let top_parent = self
            .manager
            .create_parent_job("parent", Some("job_definition".into()), Vec::new(), metadata, false)
            .await?;
        self.manager.mark_running(&top_parent.id).await?;

        let mut hard_failure = false;
        for step in definition.topological_order() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            match self.run_step(step, &definition, top_parent.id, cancel).await {
                Ok(()) => {}
                Err(StepOutcome::Cancelled) => return Err(EngineError::Cancelled),
                Err(StepOutcome::StopDefinition) => {
                    hard_failure = true;
                    break;
                }
                Err(StepOutcome::Continue) => {
                    tracing::warn!(step = %step.name, "step failed, continuing per on_error=continue");
                }
            }
        }

        if hard_failure {
            self.manager.mark_failed(&top_parent.id, "a step failed with on_error=fail").await?;
        } else {
            self.manager.mark_completed(&top_parent.id, None).await?;
        }
        Ok(top_parent.id)
    }

    /// Run one step, including its configured `on_error` strategy. Returns
    /// `Ok(())` if the step ultimately succeeded (or was allowed to
    /// continue), `Err(StepOutcome::StopDefinition)` if the whole
    /// definition must now fail.
    async fn run_step(
        &self,
        step: &Step,
        definition: &JobDefinition,
        top_parent_id: JobId,
        cancel: &CancellationToken,
    ) -> Result<(), StepOutcome> {
        let manager = self
            .step_managers
            .get(step.action.as_str())
            .ok_or_else(|| StepOutcome::from(EngineError::NoStepManager(step.action.clone())))?;

        let mut attempts_left = 1u32;
        let mut retry_delay = Duration::from_secs(5);
        let mut retry_fallback = RetryFallback::Fail;
        if let OnError::Retry { max_attempts, delay, then } = &step.on_error {
            attempts_left = *max_attempts;
            retry_delay = *delay;
            retry_fallback = *then;
        }

        loop {
            let parent_id = manager
                .create_parent_job(step, definition, top_parent_id, &self.manager, &self.monitor)
                .await
                .map_err(StepOutcome::from)?;

            let status = self.poll_until_settled(&step.name, parent_id, step.timeout, cancel).await?;
            if status != JobStatus::Failed {
                return Ok(());
            }

            attempts_left = attempts_left.saturating_sub(1);
            if attempts_left == 0 {
                break;
            }
            tracing::info!(step = %step.name, attempts_left, "retrying failed step");
            tokio::select! {
                _ = tokio::time::sleep(retry_delay) => {}
                _ = cancel.cancelled() => return Err(StepOutcome::Cancelled),
            }
        }

        match &step.on_error {
            OnError::Fail => Err(StepOutcome::StopDefinition),
            OnError::Continue => Err(StepOutcome::Continue),
            OnError::Retry { .. } => match retry_fallback {
                RetryFallback::Fail => Err(StepOutcome::StopDefinition),
                RetryFallback::Continue => Err(StepOutcome::Continue),
            },
        }
    }

    /// Poll a step's parent job until it reaches a terminal state, bounded
    /// by `timeout` if set.
    async fn poll_until_settled(
        &self,
        step_name: &str,
        parent_id: JobId,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<JobStatus, StepOutcome> {
        let deadline = timeout.map(|d| tokio::time::Instant::now() + d);
        loop {
            let job = self.manager.get_job(&parent_id).await.map_err(StepOutcome::from)?;
            if job.status.is_terminal() {
                return Ok(job.status);
            }
            if let Some(deadline) = deadline {
                if tokio::time::Instant::now() >= deadline {
                    self.monitor.stop_monitoring(&parent_id);
                    let _ = self.manager.cancel_job(&parent_id).await;
                    return Err(StepOutcome::from(EngineError::StepTimeout(step_name.to_string())));
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
                _ = cancel.cancelled() => return Err(StepOutcome::Cancelled),
            }
        }
    }
}

/// What a failed step should cause the definition run to do next.
enum StepOutcome {
    StopDefinition,
    Continue,
    Cancelled,
}

impl From<EngineError> for StepOutcome {
    fn from(err: EngineError) -> Self {
        tracing::error!(error = %err, "step failed with an engine error");
        StepOutcome::StopDefinition
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
