//! Office installation for the edition chosen before the run.

use tracing::{info, warn};

use crate::config::{InstallerConfig, OfficeConfig, OfficeEdition};
use crate::shell::{CommandOptions, Invocation};
use crate::steps::{StepDefinition, StepOutcome};

use super::packages::{classify, ExitClass};
use super::{StepContext, OFFICE};

pub fn step(office: &OfficeConfig, edition: OfficeEdition, ctx: &StepContext) -> StepDefinition {
    let installer = office.installer(edition).cloned();
    let ctx = ctx.clone();

    let mut step = StepDefinition::new(OFFICE, "Install Office", {
        let installer = installer.clone();
        move || Ok(install(edition, installer.as_ref(), &ctx))
    });

    match &installer {
        Some(cfg) => {
            step = step
                .with_detail(format!("{} from {}", edition.label(), cfg.path.display()))
                .with_preflight_paths([cfg.path.display().to_string()]);
        }
        None => step = step.with_detail(edition.label()),
    }
    step
}

/// Run the installer once. Installers are not retried.
pub fn install(
    edition: OfficeEdition,
    installer: Option<&InstallerConfig>,
    ctx: &StepContext,
) -> StepOutcome {
    if edition == OfficeEdition::Skip {
        return StepOutcome::skipped("Office not selected");
    }
    let Some(installer) = installer else {
        return StepOutcome::skipped(format!("no installer configured for {}", edition.label()));
    };

    let path = installer.path.display().to_string();
    if !ctx.probe.exists(&path) {
        return StepOutcome::failed(format!("installer not found: {}", path));
    }

    info!("Running {} installer {}", edition.label(), path);
    let invocation = Invocation::program(&installer.path, installer.args.iter().cloned());
    let mut options = CommandOptions::captured();
    options.timeout = ctx.timeouts.installer();

    let result = match ctx.runner.run(&invocation, &options) {
        Ok(result) => result,
        Err(e) => return StepOutcome::failed(e.to_string()),
    };

    if result.timed_out {
        warn!("{} installer timed out", edition.label());
        return StepOutcome::failed("installer timed out");
    }
    match classify(&result) {
        ExitClass::Installed => StepOutcome::Success,
        ExitClass::Benign(reason) => StepOutcome::warning(reason),
        ExitClass::Failed => {
            warn!("{} installer exited with {}", edition.label(), result.exit_code);
            StepOutcome::failed(format!("installer exit code {}", result.exit_code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use std::rc::Rc;

    const SETUP: &str = r"\\srv\office\setup.exe";

    fn office() -> OfficeConfig {
        OfficeConfig {
            standard: Some(InstallerConfig {
                path: SETUP.into(),
                args: vec!["/configure".into(), "config.xml".into()],
            }),
            subscription: None,
        }
    }

    #[test]
    fn skip_edition_runs_nothing() {
        let runner = Rc::new(ScriptedRunner::default());
        let ctx = context(runner.clone(), SetProbe::with([SETUP]));

        let outcome = step(&office(), OfficeEdition::Skip, &ctx).run().unwrap();

        assert!(outcome.is_skipped());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn missing_installer_fails() {
        let runner = Rc::new(ScriptedRunner::default());
        let ctx = context(runner.clone(), SetProbe::default());

        let outcome = step(&office(), OfficeEdition::Standard, &ctx).run().unwrap();

        assert_eq!(outcome, StepOutcome::failed(format!("installer not found: {}", SETUP)));
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn reboot_exit_code_is_warning() {
        let runner = Rc::new(ScriptedRunner::default());
        runner.push_exit(3010);
        let ctx = context(runner.clone(), SetProbe::with([SETUP]));

        let outcome = step(&office(), OfficeEdition::Standard, &ctx).run().unwrap();

        assert_eq!(outcome, StepOutcome::warning("reboot required"));
        assert_eq!(
            runner.invocation(0),
            Invocation::program(SETUP, ["/configure", "config.xml"])
        );
    }

    #[test]
    fn other_exit_code_fails_once() {
        let runner = Rc::new(ScriptedRunner::default());
        runner.push_exit(1603);
        let ctx = context(runner.clone(), SetProbe::with([SETUP]));

        let outcome = step(&office(), OfficeEdition::Standard, &ctx).run().unwrap();

        assert!(outcome.is_failure());
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn unconfigured_edition_is_skipped_and_needs_no_preflight() {
        let ctx = context(Rc::new(ScriptedRunner::default()), SetProbe::default());

        let step = step(&office(), OfficeEdition::Subscription, &ctx);

        assert!(step.preflight_paths().is_empty());
        assert!(step.run().unwrap().is_skipped());
    }
}
