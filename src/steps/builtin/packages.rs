//! winget package installation and installer exit code classification.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::ProvisionError;
use crate::shell::{CommandOptions, CommandResult, Invocation};
use crate::steps::{StepDefinition, StepOutcome};

use super::{StepContext, PACKAGES};

/// winget: the package is already installed.
const WINGET_ALREADY_INSTALLED: u32 = 0x8A15_0061;
/// winget: installed, no newer version applies.
const WINGET_NO_APPLICABLE_UPGRADE: u32 = 0x8A15_002B;
/// winget: install finished, restart required.
const WINGET_REBOOT_REQUIRED: u32 = 0x8A15_0109;
/// MSI: ERROR_SUCCESS_REBOOT_REQUIRED.
const MSI_REBOOT_REQUIRED: i32 = 3010;
/// MSI: ERROR_SUCCESS_REBOOT_INITIATED.
const MSI_REBOOT_INITIATED: i32 = 1641;

/// How an installer's exit should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Installed,
    /// Non-zero, but nothing is wrong.
    Benign(&'static str),
    Failed,
}

/// Classify an installer result by exit code.
///
/// Output text is only consulted when the exit code is unknown and output
/// was captured; the phrase check only works on English systems.
pub fn classify(result: &CommandResult) -> ExitClass {
    if result.timed_out {
        return ExitClass::Failed;
    }

    match result.exit_code {
        0 => return ExitClass::Installed,
        MSI_REBOOT_REQUIRED | MSI_REBOOT_INITIATED => return ExitClass::Benign("reboot required"),
        _ => {}
    }

    match result.exit_code as u32 {
        WINGET_ALREADY_INSTALLED => ExitClass::Benign("already installed"),
        WINGET_NO_APPLICABLE_UPGRADE => ExitClass::Benign("no applicable upgrade"),
        WINGET_REBOOT_REQUIRED => ExitClass::Benign("reboot required"),
        _ if result
            .combined_output()
            .to_lowercase()
            .contains("already installed") =>
        {
            ExitClass::Benign("already installed")
        }
        _ => ExitClass::Failed,
    }
}

/// The winget command line for one package id.
///
/// winget is spawned directly: a PowerShell wrapper folds every native exit
/// code other than 0 and 1 into 1, hiding the codes `classify` reads.
pub fn install_invocation(package_id: &str) -> Invocation {
    Invocation::program(
        "winget",
        [
            "install",
            "--id",
            package_id,
            "--exact",
            "--accept-source-agreements",
            "--accept-package-agreements",
            "--silent",
        ],
    )
}

pub fn step(packages: &[String], ctx: &StepContext) -> StepDefinition {
    let packages = packages.to_vec();
    let ctx = ctx.clone();
    let detail = if packages.is_empty() {
        "nothing configured".to_string()
    } else {
        packages.join(", ")
    };

    StepDefinition::new(PACKAGES, "Install packages", move || {
        Ok(install_all(&packages, &ctx))
    })
    .with_detail(detail)
}

enum InstallError {
    Exit { code: i32, output: String },
    TimedOut,
    Unavailable(ProvisionError),
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit { code, output } if output.is_empty() => write!(f, "exit code {}", code),
            Self::Exit { code, output } => {
                let last = output.lines().last().unwrap_or_default();
                write!(f, "exit code {} ({})", code, last.trim())
            }
            Self::TimedOut => write!(f, "timed out"),
            Self::Unavailable(e) => write!(f, "{}", e),
        }
    }
}

/// Install every package in order.
pub fn install_all(packages: &[String], ctx: &StepContext) -> StepOutcome {
    if packages.is_empty() {
        return StepOutcome::skipped("no packages configured");
    }

    let mut outcomes = Vec::with_capacity(packages.len());
    for id in packages {
        let outcome = install_one(id, ctx);
        let stop = matches!(&outcome, Err(InstallError::Unavailable(_)));
        outcomes.push(outcome_for(id, outcome));
        if stop {
            // Every remaining package would fail the same way.
            break;
        }
    }
    StepOutcome::combine(outcomes)
}

fn install_one(
    id: &str,
    ctx: &StepContext,
) -> std::result::Result<crate::runner::Retried<ExitClass>, InstallError> {
    let invocation = install_invocation(id);
    let mut options = CommandOptions::captured();
    options.timeout = ctx.timeouts.package();

    ctx.retry.execute_if(
        &format!("Install {}", id),
        || {
            info!("winget install {}", id);
            let result = ctx
                .runner
                .run(&invocation, &options)
                .map_err(InstallError::Unavailable)?;
            debug!("{} exited with {} in {:?}", id, result.exit_code, result.duration);

            if result.timed_out {
                return Err(InstallError::TimedOut);
            }
            match classify(&result) {
                ExitClass::Failed => Err(InstallError::Exit {
                    code: result.exit_code,
                    output: result.combined_output(),
                }),
                class => Ok(class),
            }
        },
        |e| !matches!(e, InstallError::Unavailable(_)),
    )
}

fn outcome_for(
    id: &str,
    result: std::result::Result<crate::runner::Retried<ExitClass>, InstallError>,
) -> StepOutcome {
    match result {
        Ok(done) => match done.value {
            ExitClass::Benign(reason) => {
                info!("{}: {}", id, reason);
                StepOutcome::warning(format!("{}: {}", id, reason))
            }
            _ if done.attempts > 1 => {
                StepOutcome::warning(format!("{}: retried {}x", id, done.attempts - 1))
            }
            _ => StepOutcome::Success,
        },
        Err(e) => {
            warn!("{} was not installed: {}", id, e);
            StepOutcome::failed(format!("{}: {}", id, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use std::rc::Rc;
    use std::time::Duration;

    fn result(code: i32, stdout: &str) -> CommandResult {
        CommandResult {
            exit_code: code,
            stdout: stdout.to_string(),
            stderr: String::new(),
            duration: Duration::ZERO,
            timed_out: false,
        }
    }

    #[test]
    fn classify_known_exit_codes() {
        assert_eq!(classify(&result(0, "")), ExitClass::Installed);
        assert_eq!(
            classify(&result(0x8A15_0061_u32 as i32, "")),
            ExitClass::Benign("already installed")
        );
        assert_eq!(
            classify(&result(0x8A15_002B_u32 as i32, "")),
            ExitClass::Benign("no applicable upgrade")
        );
        assert_eq!(
            classify(&result(3010, "")),
            ExitClass::Benign("reboot required")
        );
        assert_eq!(classify(&result(1, "")), ExitClass::Failed);
    }

    #[test]
    fn classify_falls_back_to_output_text() {
        let r = result(1, "Found an existing package already installed.");
        assert_eq!(classify(&r), ExitClass::Benign("already installed"));
    }

    #[test]
    fn classify_timeout_is_failure() {
        let mut r = result(0, "");
        r.timed_out = true;
        assert_eq!(classify(&r), ExitClass::Failed);
    }

    #[test]
    fn invocation_runs_winget_directly() {
        let Invocation::Program { program, args } = install_invocation("Google.Chrome") else {
            panic!("expected a direct winget invocation");
        };
        assert_eq!(program, std::path::PathBuf::from("winget"));
        assert_eq!(&args[..3], ["install", "--id", "Google.Chrome"]);
        assert_eq!(args.last().map(String::as_str), Some("--silent"));
    }

    #[cfg(unix)]
    #[test]
    fn direct_program_exit_code_reaches_classifier() {
        use crate::shell::{CommandRunner, SystemRunner};

        let result = SystemRunner::new()
            .run(
                &Invocation::program("sh", ["-c", "exit 194"]),
                &CommandOptions::captured(),
            )
            .unwrap();

        assert_eq!(result.exit_code, 194);
        assert_eq!(classify(&result), ExitClass::Failed);
    }

    #[test]
    fn failing_package_is_retried_then_failed_and_rest_continue() {
        let runner = Rc::new(ScriptedRunner::default());
        runner.push_exit(1);
        runner.push_exit(1);
        runner.push_exit(1);
        runner.push_exit(0);
        let ctx = context(runner.clone(), SetProbe::default());

        let outcome = install_all(&["Bad.Pkg".into(), "Good.Pkg".into()], &ctx);

        assert_eq!(runner.call_count(), 4);
        assert_eq!(outcome, StepOutcome::failed("Bad.Pkg: exit code 1"));
    }

    #[test]
    fn already_installed_is_warning_without_retry() {
        let runner = Rc::new(ScriptedRunner::default());
        runner.push_exit(0x8A15_0061_u32 as i32);
        let ctx = context(runner.clone(), SetProbe::default());

        let outcome = install_all(&["Google.Chrome".into()], &ctx);

        assert_eq!(runner.call_count(), 1);
        assert_eq!(outcome, StepOutcome::warning("Google.Chrome: already installed"));
    }

    #[test]
    fn transient_failure_then_success_reports_retries() {
        let runner = Rc::new(ScriptedRunner::default());
        runner.push_exit(5);
        runner.push_exit(0);
        let ctx = context(runner.clone(), SetProbe::default());

        let outcome = install_all(&["Zoom.Zoom".into()], &ctx);

        assert_eq!(outcome, StepOutcome::warning("Zoom.Zoom: retried 1x"));
    }

    #[test]
    fn missing_winget_stops_without_retry() {
        let runner = Rc::new(ScriptedRunner::default());
        runner.push_spawn_error("winget");
        let ctx = context(runner.clone(), SetProbe::default());

        let outcome = install_all(&["A".into(), "B".into()], &ctx);

        assert_eq!(runner.call_count(), 1);
        assert!(outcome.is_failure());
    }

    #[test]
    fn packages_run_captured_with_timeout() {
        let runner = Rc::new(ScriptedRunner::default());
        let ctx = context(runner.clone(), SetProbe::default());

        install_all(&["Google.Chrome".into()], &ctx);

        let calls = runner.calls.borrow();
        assert!(calls[0].1.capture);
        assert_eq!(calls[0].1.timeout, Some(Duration::from_secs(1800)));
    }
}
