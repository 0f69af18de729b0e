//! Ordered, validated step registry for one run.

use std::collections::HashSet;

use crate::error::{ProvisionError, Result};
use crate::steps::StepDefinition;

/// One line of the pre-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub id: String,
    pub label: String,
    pub detail: Option<String>,
    pub skipped: bool,
}

/// Steps in registration order plus the set excluded from this run.
///
/// Built through [`PlanBuilder`]; duplicate ids and unknown skip ids are
/// rejected there, so a `Plan` is always consistent.
#[derive(Debug)]
pub struct Plan {
    steps: Vec<StepDefinition>,
    skip: HashSet<String>,
}

impl Plan {
    pub fn builder() -> PlanBuilder {
        PlanBuilder::default()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_skipped(&self, id: &str) -> bool {
        self.skip.contains(id)
    }

    /// Number of steps that will actually run.
    pub fn active_count(&self) -> usize {
        self.steps.iter().filter(|s| !self.is_skipped(s.id())).count()
    }

    /// Pre-run summary, one entry per registered step.
    pub fn summary(&self) -> Vec<PlanEntry> {
        self.steps
            .iter()
            .map(|s| PlanEntry {
                id: s.id().to_string(),
                label: s.label().to_string(),
                detail: s.detail().map(str::to_string),
                skipped: self.is_skipped(s.id()),
            })
            .collect()
    }

    /// Network paths needed by the steps that will run, in step order.
    pub fn preflight_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.steps
            .iter()
            .filter(|s| !self.is_skipped(s.id()))
            .flat_map(|s| s.preflight_paths().iter())
            .filter(|p| seen.insert(p.as_str()))
            .cloned()
            .collect()
    }
}

/// Assembles a [`Plan`].
#[derive(Debug, Default)]
pub struct PlanBuilder {
    steps: Vec<StepDefinition>,
    skip: Vec<String>,
}

impl PlanBuilder {
    /// Register a step. Order of registration is order of execution.
    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Exclude steps by id.
    pub fn skip<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Validate and freeze the plan.
    pub fn build(self) -> Result<Plan> {
        let mut ids = HashSet::new();
        for step in &self.steps {
            if !ids.insert(step.id().to_string()) {
                return Err(ProvisionError::DuplicateStep {
                    id: step.id().to_string(),
                });
            }
        }

        for id in &self.skip {
            if !ids.contains(id) {
                let known: Vec<&str> = self.steps.iter().map(|s| s.id()).collect();
                return Err(ProvisionError::UnknownStep {
                    id: id.clone(),
                    known: known.join(", "),
                });
            }
        }

        Ok(Plan {
            steps: self.steps,
            skip: self.skip.into_iter().collect(),
        })
    }
}
