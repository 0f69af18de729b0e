//! Runs a [`Plan`] step by step and aggregates the report.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::plan::Plan;
use super::preflight::{self, FsProbe, PathProbe, PreflightResult};
use super::report::{ReportRow, RunReport};
use super::sink::{LogSink, ReportSink};
use crate::shell::CancelHandle;
use crate::steps::{StepDefinition, StepOutcome};
use crate::ui::{format_duration, Prompt, PromptType, UserInterface};

/// Reason recorded for steps excluded by `--skip` or a profile.
pub const EXCLUDED_REASON: &str = "excluded by configuration";

/// Prompt key for the pre-flight override question.
pub const PREFLIGHT_OVERRIDE_KEY: &str = "preflight_override";

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    PreflightPending,
    /// Pre-flight failed and the operator (or unattended mode) declined to go on.
    Aborted,
    Running,
    Completed,
}

/// Everything a caller needs to decide the exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub state: RunState,
    pub report: RunReport,
    pub preflight: PreflightResult,
}

impl RunOutcome {
    pub fn aborted(&self) -> bool {
        self.state == RunState::Aborted
    }

    pub fn interrupted(&self) -> bool {
        self.report.interrupted
    }

    /// Completed without failures and without interruption.
    pub fn success(&self) -> bool {
        self.state == RunState::Completed && self.report.success()
    }
}

/// Drives a plan through pre-flight and execution.
pub struct Orchestrator<'a> {
    sink: Box<dyn ReportSink + 'a>,
    probe: Box<dyn PathProbe + 'a>,
    cancel: CancelHandle,
    state: RunState,
}

impl Default for Orchestrator<'_> {
    fn default() -> Self {
        Self::new(Box::new(LogSink))
    }
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator reporting to `sink`, probing the real filesystem.
    pub fn new(sink: Box<dyn ReportSink + 'a>) -> Self {
        Self {
            sink,
            probe: Box::new(FsProbe),
            cancel: CancelHandle::new(),
            state: RunState::Idle,
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn PathProbe + 'a>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the plan.
    ///
    /// Steps run in registration order; a failed step never stops the next
    /// one. The returned report is complete for every step reached.
    pub fn run(&mut self, plan: &Plan, ui: &mut dyn UserInterface) -> RunOutcome {
        let start = Instant::now();
        self.state = RunState::Idle;

        let summary = plan.summary();
        ui.show_plan(&summary);
        self.sink.plan_started(&summary);

        self.state = RunState::PreflightPending;
        let preflight = self.preflight(plan, ui);

        if !preflight.passed() {
            for path in &preflight.failed_paths {
                ui.warning(&format!("Unreachable: {}", path));
            }
            let proceed = ui.is_interactive() && confirm_override(ui, preflight.failed_paths.len());
            self.sink.preflight_finished(&preflight, proceed);

            if !proceed {
                ui.error("Pre-flight check failed; nothing was run.");
                self.state = RunState::Aborted;
                let report = RunReport {
                    elapsed: start.elapsed(),
                    ..Default::default()
                };
                self.sink.run_finished(self.state, &report);
                return RunOutcome {
                    state: self.state,
                    report,
                    preflight,
                };
            }
        } else {
            self.sink.preflight_finished(&preflight, true);
        }

        self.state = RunState::Running;
        let mut report = RunReport::default();
        let total = plan.active_count();
        let mut index = 0;

        for step in plan.steps() {
            if self.cancel.is_cancelled() {
                warn!("Interrupted before step '{}'", step.id());
                ui.warning("Interrupted; remaining steps were not run.");
                report.interrupted = true;
                break;
            }

            let row = if plan.is_skipped(step.id()) {
                debug!("Skipping step '{}'", step.id());
                ReportRow {
                    id: step.id().to_string(),
                    label: step.label().to_string(),
                    outcome: StepOutcome::skipped(EXCLUDED_REASON),
                    detail: step.detail().map(str::to_string),
                    duration: Duration::ZERO,
                }
            } else {
                index += 1;
                ui.show_progress(index, total);
                ui.message(&format!("{}...", step.label()));
                execute_step(step)
            };

            render_row(ui, &row);
            self.sink.step_finished(&row);
            report.rows.push(row);
        }

        report.elapsed = start.elapsed();
        self.state = RunState::Completed;
        self.sink.run_finished(self.state, &report);
        ui.show_report(&report);

        RunOutcome {
            state: self.state,
            report,
            preflight,
        }
    }

    fn preflight(&self, plan: &Plan, ui: &mut dyn UserInterface) -> PreflightResult {
        let paths = plan.preflight_paths();
        if paths.is_empty() {
            return PreflightResult::default();
        }

        let mut spinner = ui.start_spinner(&format!("Checking {} network path(s)...", paths.len()));
        let result = preflight::check(&paths, self.probe.as_ref());
        if result.passed() {
            spinner.finish_success("Network paths reachable");
        } else {
            spinner.finish_error(&format!(
                "{} of {} network path(s) unreachable",
                result.failed_paths.len(),
                paths.len()
            ));
        }
        result
    }
}

fn confirm_override(ui: &mut dyn UserInterface, failed: usize) -> bool {
    let prompt = Prompt {
        key: PREFLIGHT_OVERRIDE_KEY.to_string(),
        question: format!("{} required path(s) are unreachable. Continue anyway?", failed),
        prompt_type: PromptType::Confirm,
        default: Some("false".to_string()),
    };

    match ui.prompt(&prompt) {
        Ok(answer) => answer.as_bool().unwrap_or(false),
        Err(e) => {
            warn!("Pre-flight prompt failed: {}", e);
            false
        }
    }
}

/// Run one operation, converting errors and panics into `Failed`.
fn execute_step(step: &StepDefinition) -> ReportRow {
    let start = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| step.run()));

    let outcome = match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!("Step '{}' errored: {:#}", step.id(), e);
            StepOutcome::failed(format!("{:#}", e))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Step '{}' panicked: {}", step.id(), message);
            StepOutcome::failed(format!("panicked: {}", message))
        }
    };

    ReportRow {
        id: step.id().to_string(),
        label: step.label().to_string(),
        outcome,
        detail: step.detail().map(str::to_string),
        duration: start.elapsed(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn render_row(ui: &mut dyn UserInterface, row: &ReportRow) {
    let took = format_duration(row.duration);
    match &row.outcome {
        StepOutcome::Success => ui.success(&format!("{} ({})", row.label, took)),
        StepOutcome::SuccessWithWarning(reason) => {
            ui.warning(&format!("{}: {} ({})", row.label, reason, took))
        }
        StepOutcome::Skipped(reason) => ui.message(&format!("{} skipped: {}", row.label, reason)),
        StepOutcome::Failed(error) => ui.error(&format!("{} failed: {} ({})", row.label, error, took)),
    }
}
