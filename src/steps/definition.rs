//! Named, independently-failable units of provisioning work.

use std::fmt;

use super::outcome::StepOutcome;

/// The work a step performs.
pub type StepOperation = Box<dyn Fn() -> anyhow::Result<StepOutcome>>;

/// A registered step. Immutable once built.
pub struct StepDefinition {
    id: String,
    label: String,
    detail: Option<String>,
    preflight_paths: Vec<String>,
    operation: StepOperation,
}

impl StepDefinition {
    /// Create a step from an owned closure.
    pub fn new<F>(id: impl Into<String>, label: impl Into<String>, operation: F) -> Self
    where
        F: Fn() -> anyhow::Result<StepOutcome> + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            detail: None,
            preflight_paths: Vec::new(),
            operation: Box::new(operation),
        }
    }

    /// Attach a one-line description shown in the plan summary.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Declare network paths that must be reachable before the run starts.
    pub fn with_preflight_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preflight_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn preflight_paths(&self) -> &[String] {
        &self.preflight_paths
    }

    /// Invoke the operation.
    pub fn run(&self) -> anyhow::Result<StepOutcome> {
        (self.operation)()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("detail", &self.detail)
            .field("preflight_paths", &self.preflight_paths)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let step = StepDefinition::new("folders", "Copy network folders", || {
            Ok(StepOutcome::Success)
        })
        .with_detail("2 folders")
        .with_preflight_paths([r"\\srv\share\a", r"\\srv\share\b"]);

        assert_eq!(step.id(), "folders");
        assert_eq!(step.label(), "Copy network folders");
        assert_eq!(step.detail(), Some("2 folders"));
        assert_eq!(step.preflight_paths().len(), 2);
    }

    #[test]
    fn run_invokes_operation() {
        let step = StepDefinition::new("x", "X", || Ok(StepOutcome::warning("reboot required")));
        assert_eq!(step.run().unwrap(), StepOutcome::warning("reboot required"));
    }

    #[test]
    fn debug_omits_operation() {
        let step = StepDefinition::new("x", "X", || Ok(StepOutcome::Success));
        let debug = format!("{:?}", step);
        assert!(debug.contains("\"x\""));
    }
}
