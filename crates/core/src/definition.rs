// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobDefinition`: the immutable declarative input the Orchestrator drives.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

crate::define_id! {
    /// Identifier of a stored job definition, persisted into a top-level
    /// parent's `metadata["job_definition_id"]`.
    pub struct JobDefinitionId("def-");
}

/// What a step's parent job should do when it ends in `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OnError {
    /// Fail the whole definition immediately (the default).
    Fail,
    /// Log the failure and proceed to the next step.
    Continue,
    /// Re-run the step up to `max_attempts` times, waiting `delay` between
    /// attempts, then fall back to `then`.
    Retry {
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
        #[serde(default = "default_retry_delay", with = "duration_secs")]
        delay: Duration,
        #[serde(default)]
        then: RetryFallback,
    },
}

impl Default for OnError {
    fn default() -> Self {
        OnError::Fail
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

/// What to do once `retry`'s attempts are exhausted. Falls back to `fail`
/// when unspecified.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryFallback {
    #[default]
    Fail,
    Continue,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// One node of a `JobDefinition`'s step DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub action: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub on_error: OnError,
    /// Bound on how long the Orchestrator will poll this step's parent
    /// before treating it as failed.
    #[serde(default, with = "opt_duration_secs")]
    pub timeout: Option<Duration>,
    /// Opaque, worker/StepManager-defined configuration.
    #[serde(default)]
    pub config: Vec<u8>,
}

mod opt_duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

/// Errors raised while validating a [`JobDefinition`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("step '{0}' depends on unknown step '{1}'")]
    UnknownDependency(String, String),
    #[error("duplicate step name '{0}'")]
    DuplicateStep(String),
    #[error("cyclic dependency detected involving step '{0}'")]
    CyclicDependency(String),
}

/// Immutable declarative workflow input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: JobDefinitionId,
    pub name: String,
    pub steps: Vec<Step>,
}

impl JobDefinition {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self { id: JobDefinitionId::new(), name: name.into(), steps }
    }

    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Validate that step names are unique, every `depends_on` refers to a
    /// real step, and the dependency graph is acyclic — a cycle or a
    /// dangling reference is a validation error, not a panic.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(DefinitionError::DuplicateStep(step.name.clone()));
            }
        }
        let by_name: HashMap<&str, &Step> =
            self.steps.iter().map(|s| (s.name.as_str(), s)).collect();
        for step in &self.steps {
            for dep in &step.depends_on {
                if !by_name.contains_key(dep.as_str()) {
                    return Err(DefinitionError::UnknownDependency(
                        step.name.clone(),
                        dep.clone(),
                    ));
                }
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = HashMap::new();

        fn visit<'a>(
            name: &'a str,
            by_name: &HashMap<&'a str, &'a Step>,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Result<(), DefinitionError> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(DefinitionError::CyclicDependency(name.to_string()))
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            if let Some(step) = by_name.get(name) {
                for dep in &step.depends_on {
                    visit(dep, by_name, marks)?;
                }
            }
            marks.insert(name, Mark::Done);
            Ok(())
        }

        for step in &self.steps {
            visit(&step.name, &by_name, &mut marks)?;
        }
        Ok(())
    }

    /// Steps in an order where every step appears after everything it
    /// `depends_on`. Assumes [`validate`] already passed — panics-free;
    /// unresolved names were rejected there.
    pub fn topological_order(&self) -> Vec<&Step> {
        let by_name: HashMap<&str, &Step> =
            self.steps.iter().map(|s| (s.name.as_str(), s)).collect();
        let mut ordered = Vec::with_capacity(self.steps.len());
        let mut done = HashSet::new();

        fn visit<'a>(
            name: &'a str,
            by_name: &HashMap<&'a str, &'a Step>,
            done: &mut HashSet<&'a str>,
            ordered: &mut Vec<&'a Step>,
        ) {
            if done.contains(name) {
                return;
            }
            if let Some(step) = by_name.get(name) {
                for dep in &step.depends_on {
                    visit(dep, by_name, done, ordered);
                }
                done.insert(name);
                ordered.push(step);
            }
        }

        for step in &self.steps {
            visit(&step.name, &by_name, &mut done, &mut ordered);
        }
        ordered
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
