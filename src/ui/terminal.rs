//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;
use crate::runner::{PlanEntry, RunReport, RunVerdict};

use super::{
    format_duration, prompt_user, NonInteractiveUI, OutputMode, ProgressSpinner, Prompt,
    PromptResult, ProvisionerTheme, SpinnerHandle, Table, UserInterface,
};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: ProvisionerTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            term: Term::stdout(),
            theme: ProvisionerTheme::detect(),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        prompt_user(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_status() {
            writeln!(
                self.term,
                "{}",
                self.theme
                    .step_number
                    .apply_to(format!("[{}/{}]", current, total))
            )
            .ok();
        }
    }

    fn show_plan(&mut self, entries: &[PlanEntry]) {
        if !self.mode.shows_status() {
            return;
        }

        let mut table = Table::new(["#", "Step", "Details", ""]);
        for (i, entry) in entries.iter().enumerate() {
            let marker = if entry.skipped { "skipped" } else { "" };
            table.add_row([
                (i + 1).to_string(),
                entry.label.clone(),
                entry.detail.clone().unwrap_or_default(),
                marker.to_string(),
            ]);
        }

        writeln!(self.term, "\n{}", self.theme.format_header("Provisioning plan")).ok();
        writeln!(self.term, "{}\n", table.render()).ok();
    }

    fn show_report(&mut self, report: &RunReport) {
        let mut table = Table::new(["Step", "Detail", "Status", "Time", "Note"]);
        for row in &report.rows {
            table.add_row([
                row.label.clone(),
                row.detail.clone().unwrap_or_default(),
                self.theme.format_status(&row.outcome),
                format_duration(row.duration),
                row.outcome.reason().unwrap_or_default().to_string(),
            ]);
        }

        writeln!(self.term, "\n{}", self.theme.format_header("Summary")).ok();
        writeln!(self.term, "{}", table.render()).ok();

        let (ok, warned, skipped, failed) = report.counts();
        let totals = format!(
            "Total {} · {} ok · {} warnings · {} skipped · {} failed",
            format_duration(report.elapsed),
            ok,
            warned,
            skipped,
            failed
        );
        let line = match report.verdict() {
            RunVerdict::Success => self.theme.format_success(&totals),
            RunVerdict::PartialSuccess => self.theme.format_warning(&totals),
            RunVerdict::Failure => self.theme.format_error(&totals),
        };
        writeln!(self.term, "{}", line).ok();
        if report.interrupted {
            writeln!(self.term, "{}", self.theme.format_warning("Run was interrupted")).ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
