//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::{load_config, validate, LoadedConfig, Profile, ProvisionConfig};
use crate::error::{ProvisionError, Result};
use crate::runner::RunOutcome;
use crate::ui::UserInterface;

/// Process exit code: everything ran, possibly with warnings.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code: at least one step failed.
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code: pre-flight failed and the run was not started.
pub const EXIT_ABORTED: i32 = 2;
/// Process exit code: interrupted by Ctrl+C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: EXIT_SUCCESS,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Map an orchestrator outcome to the process exit contract.
    pub fn from_run(outcome: &RunOutcome) -> Self {
        if outcome.aborted() {
            Self::failure(EXIT_ABORTED)
        } else if outcome.interrupted() {
            Self::failure(EXIT_INTERRUPTED)
        } else if outcome.success() {
            Self::success()
        } else {
            Self::failure(EXIT_FAILURE)
        }
    }
}

/// Load the configuration and reject invalid files up front.
pub fn load_validated(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = load_config(explicit)?;
    validate(&loaded.config)?;
    Ok(loaded)
}

/// Look up `--profile`; an unknown name is an error.
pub fn find_profile(config: &ProvisionConfig, name: Option<&str>) -> Result<Option<Profile>> {
    let Some(name) = name else {
        return Ok(None);
    };
    match config.profile(name) {
        Some(profile) => Ok(Some(profile.clone())),
        None => {
            let known: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            Err(ProvisionError::ConfigValidationError {
                message: format!(
                    "Unknown profile '{}' (known: {})",
                    name,
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                ),
            })
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config_path: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a dispatcher; `config_path` is the `--config` override.
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.config_path.as_deref();
        match &cli.command {
            Some(Commands::Run(args)) => {
                super::run::RunCommand::new(config, args.clone()).execute(ui)
            }
            Some(Commands::Identity(args)) => {
                super::identity::IdentityCommand::new(config, args.clone()).execute(ui)
            }
            Some(Commands::List(args)) => {
                super::list::ListCommand::new(config, args.clone()).execute(ui)
            }
            Some(Commands::Diagnose(args)) => {
                super::diagnose::DiagnoseCommand::new(config, args.clone()).execute(ui)
            }
            Some(Commands::Update(args)) => {
                super::update::UpdateCommand::new(config, args.clone()).execute(ui)
            }
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
            None => {
                // Default to run command with default args
                super::run::RunCommand::new(config, RunArgs::default()).execute(ui)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{PreflightResult, RunReport, RunState};

    fn outcome(state: RunState, report: RunReport) -> RunOutcome {
        RunOutcome {
            state,
            report,
            preflight: PreflightResult::default(),
        }
    }

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn aborted_run_exits_2() {
        let result = CommandResult::from_run(&outcome(RunState::Aborted, RunReport::default()));
        assert_eq!(result.exit_code, EXIT_ABORTED);
    }

    #[test]
    fn interrupted_run_exits_130() {
        let report = RunReport {
            interrupted: true,
            ..Default::default()
        };
        let result = CommandResult::from_run(&outcome(RunState::Completed, report));
        assert_eq!(result.exit_code, EXIT_INTERRUPTED);
    }

    #[test]
    fn clean_run_exits_0() {
        let result = CommandResult::from_run(&outcome(RunState::Completed, RunReport::default()));
        assert_eq!(result, CommandResult::success());
    }

    #[test]
    fn unknown_profile_lists_known_names() {
        let mut config = ProvisionConfig::default();
        config.profiles.insert("lab".into(), Profile::default());

        let err = find_profile(&config, Some("office")).unwrap_err();

        assert!(err.to_string().contains("known: lab"));
        assert!(find_profile(&config, None).unwrap().is_none());
    }
}
