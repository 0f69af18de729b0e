//! Diagnose command implementation.
//!
//! The `provisioner diagnose` command checks what a run depends on without
//! changing anything: the configured network paths, winget, and internet
//! access. Internet access is informational; a machine on an isolated
//! network can still be provisioned from the shares.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::cli::args::DiagnoseArgs;
use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::runner::{preflight, FsProbe, PathProbe};
use crate::shell::{CommandOptions, CommandRunner, Invocation, SystemRunner};
use crate::ui::{Table, UserInterface};

use super::dispatcher::{load_validated, Command, CommandResult, EXIT_FAILURE};

const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// One diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub target: String,
    pub passed: bool,
    /// A failed critical check fails the command.
    pub critical: bool,
}

/// The diagnose command implementation.
pub struct DiagnoseCommand {
    config_path: Option<PathBuf>,
    args: DiagnoseArgs,
}

impl DiagnoseCommand {
    /// Create a new diagnose command.
    pub fn new(config_path: Option<&Path>, args: DiagnoseArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }
}

impl Command for DiagnoseCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = load_validated(self.config_path.as_deref())?;

        let mut spinner = ui.start_spinner("Running diagnostics...");
        let checks = run_checks(&loaded.config, self.args.offline, &SystemRunner::new(), &FsProbe);
        spinner.finish_success("Diagnostics finished");

        let mut table = Table::new(["Check", "Target", "Result"]);
        for check in &checks {
            let result = match (check.passed, check.critical) {
                (true, _) => "ok",
                (false, true) => "FAILED",
                (false, false) => "unavailable",
            };
            table.add_row([check.name.clone(), check.target.clone(), result.to_string()]);
        }
        ui.show_header("Diagnostics");
        ui.message(&table.render());

        let passed = checks.iter().filter(|c| c.passed).count();
        info!("Diagnostics: {}/{} checks passed", passed, checks.len());

        if checks.iter().any(|c| c.critical && !c.passed) {
            ui.error(&format!("{}/{} checks passed", passed, checks.len()));
            Ok(CommandResult::failure(EXIT_FAILURE))
        } else {
            ui.success(&format!("{}/{} checks passed", passed, checks.len()));
            Ok(CommandResult::success())
        }
    }
}

/// Every path a full run could need, in config order.
pub fn configured_paths(config: &ProvisionConfig) -> Vec<String> {
    let mut paths: Vec<String> = config
        .folders
        .iter()
        .map(|f| f.source.display().to_string())
        .collect();
    paths.extend(
        [&config.office.standard, &config.office.subscription]
            .into_iter()
            .flatten()
            .map(|installer| installer.path.display().to_string()),
    );
    paths
}

pub fn run_checks(
    config: &ProvisionConfig,
    offline: bool,
    runner: &dyn CommandRunner,
    probe: &dyn PathProbe,
) -> Vec<Check> {
    let mut checks = Vec::new();

    let paths = configured_paths(config);
    let result = preflight::check(&paths, probe);
    for path in &paths {
        if checks.iter().any(|c: &Check| &c.target == path) {
            continue;
        }
        checks.push(Check {
            name: "Network path".to_string(),
            target: path.clone(),
            passed: !result.failed_paths.contains(path),
            critical: true,
        });
    }

    let winget = runner.run(
        &Invocation::program("winget", ["--version"]),
        &CommandOptions::captured().with_timeout(PROBE_TIMEOUT),
    );
    checks.push(Check {
        name: "Package manager".to_string(),
        target: match &winget {
            Ok(r) if r.success() => format!("winget {}", r.stdout.trim()),
            _ => "winget".to_string(),
        },
        passed: matches!(&winget, Ok(r) if r.success()),
        critical: !config.packages.is_empty(),
    });

    if !offline {
        let ping = runner.run(
            &Invocation::powershell("Test-Connection -ComputerName 8.8.8.8 -Count 1 -Quiet"),
            &CommandOptions::captured().with_timeout(PROBE_TIMEOUT),
        );
        checks.push(Check {
            name: "Internet".to_string(),
            target: "8.8.8.8".to_string(),
            passed: matches!(&ping, Ok(r) if r.success() && r.stdout.contains("True")),
            critical: false,
        });
    }

    checks
}
