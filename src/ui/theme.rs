//! Visual theme and styling.

use console::Style;

use crate::steps::StepOutcome;

/// Console styles used across the terminal UI.
#[derive(Debug, Clone)]
pub struct ProvisionerTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warnings (yellow).
    pub warning: Style,
    /// Style for errors (red bold).
    pub error: Style,
    /// Style for dim/secondary text (skips, durations, paths).
    pub dim: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for step counters.
    pub step_number: Style,
}

impl Default for ProvisionerTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisionerTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            header: Style::new().cyan().bold(),
            step_number: Style::new().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            header: Style::new(),
            step_number: Style::new(),
        }
    }

    /// Theme honouring [`should_use_colors`].
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        self.success.apply_to(format!("✓ {}", msg)).to_string()
    }

    pub fn format_warning(&self, msg: &str) -> String {
        self.warning.apply_to(format!("⚠ {}", msg)).to_string()
    }

    pub fn format_error(&self, msg: &str) -> String {
        self.error.apply_to(format!("✗ {}", msg)).to_string()
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        self.dim.apply_to(format!("⊘ {}", msg)).to_string()
    }

    pub fn format_header(&self, title: &str) -> String {
        self.header.apply_to(format!("== {} ==", title)).to_string()
    }

    /// Colour a status word by outcome.
    pub fn format_status(&self, outcome: &StepOutcome) -> String {
        let style = match outcome {
            StepOutcome::Success => &self.success,
            StepOutcome::SuccessWithWarning(_) => &self.warning,
            StepOutcome::Skipped(_) => &self.dim,
            StepOutcome::Failed(_) => &self.error,
        };
        style
            .apply_to(format!("{} {}", outcome.display_char(), outcome.status()))
            .to_string()
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}
