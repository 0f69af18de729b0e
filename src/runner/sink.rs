//! Destinations for run progress besides the terminal.

use tracing::{error, info, warn};

use super::orchestrator::RunState;
use super::plan::PlanEntry;
use super::preflight::PreflightResult;
use super::report::{ReportRow, RunReport};
use crate::ui::format_duration;

/// Receives the plan, each finished row and the final report.
///
/// Injected into the orchestrator at construction.
pub trait ReportSink {
    fn plan_started(&mut self, entries: &[PlanEntry]);

    fn preflight_finished(&mut self, result: &PreflightResult, proceeding: bool);

    fn step_finished(&mut self, row: &ReportRow);

    fn run_finished(&mut self, state: RunState, report: &RunReport);
}

/// Writes structured `tracing` events (picked up by the log file layer).
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn plan_started(&mut self, entries: &[PlanEntry]) {
        info!(steps = entries.len(), "Provisioning plan");
        for entry in entries {
            info!(
                step = %entry.id,
                skipped = entry.skipped,
                "  {}{}",
                entry.label,
                entry.detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default()
            );
        }
    }

    fn preflight_finished(&mut self, result: &PreflightResult, proceeding: bool) {
        if result.passed() {
            info!("Pre-flight check passed");
            return;
        }
        for path in &result.failed_paths {
            warn!(path = %path, "Unreachable path");
        }
        if proceeding {
            warn!("Continuing despite unreachable paths");
        } else {
            error!("Pre-flight check failed; run aborted");
        }
    }

    fn step_finished(&mut self, row: &ReportRow) {
        let duration = format_duration(row.duration);
        match row.outcome.reason() {
            _ if row.outcome.is_failure() => error!(
                step = %row.id,
                outcome = row.outcome.status(),
                duration = %duration,
                "{}: {}",
                row.label,
                row.outcome.reason().unwrap_or_default()
            ),
            Some(reason) => warn!(
                step = %row.id,
                outcome = row.outcome.status(),
                duration = %duration,
                "{}: {}",
                row.label,
                reason
            ),
            None => info!(
                step = %row.id,
                outcome = row.outcome.status(),
                duration = %duration,
                "{}",
                row.label
            ),
        }
    }

    fn run_finished(&mut self, state: RunState, report: &RunReport) {
        let (ok, warned, skipped, failed) = report.counts();
        info!(
            state = ?state,
            verdict = ?report.verdict(),
            interrupted = report.interrupted,
            elapsed = %format_duration(report.elapsed),
            "Run finished: {} succeeded, {} with warnings, {} skipped, {} failed",
            ok,
            warned,
            skipped,
            failed
        );
    }
}
