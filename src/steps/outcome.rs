//! Terminal result of one step.

use std::fmt;

/// Outcome of a step operation.
///
/// Operations return this instead of signalling failure through errors; the
/// orchestrator only falls back to `Failed` when an operation errors or panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did what it was asked to.
    Success,

    /// The step finished but something deserves attention
    /// (already installed, reboot required, optional tool missing).
    SuccessWithWarning(String),

    /// The step was not run.
    Skipped(String),

    /// The step failed; later steps still run.
    Failed(String),
}

impl StepOutcome {
    pub fn warning(reason: impl Into<String>) -> Self {
        Self::SuccessWithWarning(reason.into())
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed(error.into())
    }

    /// Only `Failed` counts against the run.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::SuccessWithWarning(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// The attached reason or error, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::SuccessWithWarning(r) | Self::Skipped(r) | Self::Failed(r) => Some(r),
        }
    }

    /// Short status word for tables and logs.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::SuccessWithWarning(_) => "warning",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    /// Get a display character for this outcome.
    pub fn display_char(&self) -> char {
        match self {
            Self::Success => '✓',
            Self::SuccessWithWarning(_) => '⚠',
            Self::Skipped(_) => '⊘',
            Self::Failed(_) => '✗',
        }
    }

    /// Merge sub-operation outcomes into one step outcome.
    ///
    /// Any failure wins, then warnings; reasons of the same kind are joined.
    pub fn combine<I: IntoIterator<Item = StepOutcome>>(outcomes: I) -> StepOutcome {
        let mut failures = Vec::new();
        let mut warnings = Vec::new();

        for outcome in outcomes {
            match outcome {
                Self::Failed(r) => failures.push(r),
                Self::SuccessWithWarning(r) => warnings.push(r),
                Self::Success | Self::Skipped(_) => {}
            }
        }

        if !failures.is_empty() {
            Self::Failed(failures.join("; "))
        } else if !warnings.is_empty() {
            Self::SuccessWithWarning(warnings.join("; "))
        } else {
            Self::Success
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {}", self.status(), reason),
            None => write!(f, "{}", self.status()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failed_is_failure() {
        assert!(StepOutcome::failed("x").is_failure());
        assert!(!StepOutcome::Success.is_failure());
        assert!(!StepOutcome::warning("x").is_failure());
        assert!(!StepOutcome::skipped("x").is_failure());
    }

    #[test]
    fn display_includes_reason() {
        assert_eq!(StepOutcome::Success.to_string(), "success");
        assert_eq!(
            StepOutcome::failed("installer not found").to_string(),
            "failed: installer not found"
        );
    }

    #[test]
    fn combine_prefers_failures_then_warnings() {
        let combined = StepOutcome::combine(vec![
            StepOutcome::Success,
            StepOutcome::warning("Git already installed"),
            StepOutcome::failed("7zip: exit 1"),
            StepOutcome::failed("VLC: exit 2"),
        ]);
        assert_eq!(combined, StepOutcome::failed("7zip: exit 1; VLC: exit 2"));

        let combined = StepOutcome::combine(vec![
            StepOutcome::warning("a"),
            StepOutcome::Success,
            StepOutcome::warning("b"),
        ]);
        assert_eq!(combined, StepOutcome::warning("a; b"));
    }

    #[test]
    fn combine_of_nothing_is_success() {
        assert_eq!(StepOutcome::combine(Vec::new()), StepOutcome::Success);
    }
}
