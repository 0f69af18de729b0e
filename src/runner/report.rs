//! Aggregated per-step results of a run.

use std::time::Duration;

use crate::steps::StepOutcome;

/// One finished step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub id: String,
    pub label: String,
    pub outcome: StepOutcome,
    /// The step's one-line description, as shown in the plan.
    pub detail: Option<String>,
    pub duration: Duration,
}

/// Overall classification of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    /// Every step succeeded or was skipped.
    Success,
    /// No failures, but at least one warning.
    PartialSuccess,
    /// At least one step failed, or the run did not complete.
    Failure,
}

/// Rows in execution order plus timing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub rows: Vec<ReportRow>,
    pub elapsed: Duration,
    /// The run stopped early on an interrupt.
    pub interrupted: bool,
}

impl RunReport {
    /// True when no row failed and the run was not interrupted.
    pub fn success(&self) -> bool {
        !self.interrupted && !self.rows.iter().any(|r| r.outcome.is_failure())
    }

    pub fn verdict(&self) -> RunVerdict {
        if !self.success() {
            RunVerdict::Failure
        } else if self.rows.iter().any(|r| r.outcome.is_warning()) {
            RunVerdict::PartialSuccess
        } else {
            RunVerdict::Success
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.outcome.is_failure())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.outcome.is_warning())
    }

    pub fn row(&self, id: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Counts of (succeeded, warned, skipped, failed) rows.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        self.rows
            .iter()
            .fold((0, 0, 0, 0), |(ok, warn, skip, fail), r| match r.outcome {
                StepOutcome::Success => (ok + 1, warn, skip, fail),
                StepOutcome::SuccessWithWarning(_) => (ok, warn + 1, skip, fail),
                StepOutcome::Skipped(_) => (ok, warn, skip + 1, fail),
                StepOutcome::Failed(_) => (ok, warn, skip, fail + 1),
            })
    }
}
