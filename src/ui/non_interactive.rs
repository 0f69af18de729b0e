//! UI for unattended runs (profiles, CI, redirected output).

use crate::error::{ProvisionError, Result};
use crate::runner::{PlanEntry, RunReport};

use super::{report_line, OutputMode, Prompt, PromptResult, SpinnerHandle, UserInterface};

/// UI implementation for unattended mode.
///
/// Writes plain lines suitable for log capture. Any prompt is an error:
/// unattended runs must get every answer from the profile or the command line.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("⚠ {}", msg);
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        Err(ProvisionError::ConfigValidationError {
            message: format!(
                "Cannot ask '{}' in unattended mode; supply it through the profile or flags",
                prompt.question
            ),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("{}", message);
        }
        Box::new(LineSpinner {
            quiet: !self.mode.shows_status(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n== {} ==\n", title);
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_status() {
            println!("[{}/{}]", current, total);
        }
    }

    fn show_plan(&mut self, entries: &[PlanEntry]) {
        if !self.mode.shows_status() {
            return;
        }
        println!("Provisioning plan:");
        for (i, entry) in entries.iter().enumerate() {
            let skipped = if entry.skipped { " (skipped)" } else { "" };
            match &entry.detail {
                Some(detail) => println!("  {}. {} - {}{}", i + 1, entry.label, detail, skipped),
                None => println!("  {}. {}{}", i + 1, entry.label, skipped),
            }
        }
    }

    fn show_report(&mut self, report: &RunReport) {
        println!("Summary:");
        for row in &report.rows {
            println!("  {}", report_line(&row.label, row.detail.as_deref(), &row.outcome, row.duration));
        }
        let (ok, warned, skipped, failed) = report.counts();
        println!(
            "Total {}: {} ok, {} warnings, {} skipped, {} failed{}",
            super::format_duration(report.elapsed),
            ok,
            warned,
            skipped,
            failed,
            if report.interrupted { " (interrupted)" } else { "" }
        );
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner stand-in that prints the final line only.
struct LineSpinner {
    quiet: bool,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if !self.quiet {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn finish_skipped(&mut self, msg: &str) {
        if !self.quiet {
            println!("⊘ {}", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn prompt_is_an_error_even_with_default() {
        let mut ui = NonInteractiveUI::new(OutputMode::Normal);
        let prompt = Prompt::confirm("reboot", "Reboot now?", true);

        let err = ui.prompt(&prompt).unwrap_err();
        assert!(err.to_string().contains("Reboot now?"));
    }
}
