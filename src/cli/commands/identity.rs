//! Identity command implementation.
//!
//! The `provisioner identity` command renames the machine and joins the
//! domain. Missing parameters are prompted for interactively and are
//! mandatory in unattended mode.

use std::path::{Path, PathBuf};

use crate::cli::args::IdentityArgs;
use crate::config::{Profile, ProvisionConfig};
use crate::error::{ProvisionError, Result};
use crate::runner::{LogSink, Orchestrator, Plan};
use crate::shell::CancelHandle;
use crate::steps::builtin::identity::{
    self, is_valid_admin_user, is_valid_domain, is_valid_hostname, IdentityRequest,
    ADMIN_USER_HINT, DOMAIN_HINT, HOSTNAME_HINT,
};
use crate::steps::StepContext;
use crate::ui::{Prompt, PromptType, UserInterface};

use super::dispatcher::{find_profile, load_validated, Command, CommandResult, EXIT_ABORTED};

/// Invalid answers tolerated per field before giving up.
const MAX_PROMPT_ATTEMPTS: usize = 3;

/// The identity command implementation.
pub struct IdentityCommand {
    config_path: Option<PathBuf>,
    args: IdentityArgs,
}

impl IdentityCommand {
    /// Create a new identity command.
    pub fn new(config_path: Option<&Path>, args: IdentityArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }
}

impl Command for IdentityCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = load_validated(self.config_path.as_deref())?;
        let profile = find_profile(&loaded.config, self.args.profile.as_deref())?;

        let unattended =
            self.args.non_interactive || profile.is_some() || !ui.is_interactive();
        let request = resolve_request(&loaded.config, &self.args, profile.as_ref(), unattended, ui)?;

        if !unattended {
            ui.message(&format!(
                "New name: {}\nDomain:   {}\nAccount:  {}",
                request.hostname, request.domain, request.admin_user
            ));
            let confirmed = ui
                .prompt(&Prompt::confirm("confirm_identity", "Apply these settings?", true))?
                .as_bool()
                .unwrap_or(false);
            if !confirmed {
                ui.warning("Cancelled; nothing was changed.");
                return Ok(CommandResult::failure(EXIT_ABORTED));
            }
        }

        let ctx = StepContext::system(&loaded.config)?;
        let plan = Plan::builder()
            .step(identity::step(request, &ctx))
            .build()?;

        let mut orchestrator =
            Orchestrator::new(Box::new(LogSink)).with_cancel(CancelHandle::from_interrupts());
        let outcome = orchestrator.run(&plan, ui);

        Ok(CommandResult::from_run(&outcome))
    }
}

/// Merge flags, profile, config defaults and prompts into a request.
pub fn resolve_request(
    config: &ProvisionConfig,
    args: &IdentityArgs,
    profile: Option<&Profile>,
    unattended: bool,
    ui: &mut dyn UserInterface,
) -> Result<IdentityRequest> {
    let hostname = args
        .hostname
        .clone()
        .or_else(|| profile.and_then(|p| p.hostname.clone()));
    let domain = args
        .domain
        .clone()
        .or_else(|| profile.and_then(|p| p.domain.clone()));
    let admin_user = args
        .admin_user
        .clone()
        .or_else(|| profile.and_then(|p| p.admin_user.clone()));

    let hostname = field(
        "hostname",
        "New computer name",
        hostname,
        None,
        is_valid_hostname,
        HOSTNAME_HINT,
        unattended,
        ui,
    )?;
    // Unattended runs take the configured domain as is; interactive runs offer it.
    let (domain, suggested) = match domain {
        Some(domain) => (Some(domain), None),
        None if unattended => (config.default_domain.clone(), None),
        None => (None, config.default_domain.clone()),
    };
    let domain = field(
        "domain",
        "Domain",
        domain,
        suggested,
        is_valid_domain,
        DOMAIN_HINT,
        unattended,
        ui,
    )?;
    let admin_user = field(
        "admin_user",
        "Domain admin account",
        admin_user,
        None,
        is_valid_admin_user,
        ADMIN_USER_HINT,
        unattended,
        ui,
    )?;

    let reboot = if args.reboot || profile.is_some_and(|p| p.auto_reboot) {
        true
    } else if unattended {
        false
    } else {
        ui.prompt(&Prompt::confirm(
            "reboot",
            "Restart automatically after joining?",
            false,
        ))?
        .as_bool()
        .unwrap_or(false)
    };

    Ok(IdentityRequest {
        hostname,
        domain,
        admin_user,
        reboot,
        unattended,
    })
}

/// A supplied value is validated once; a missing one is prompted for.
#[allow(clippy::too_many_arguments)]
fn field(
    key: &str,
    question: &str,
    supplied: Option<String>,
    default: Option<String>,
    is_valid: fn(&str) -> bool,
    hint: &str,
    unattended: bool,
    ui: &mut dyn UserInterface,
) -> Result<String> {
    if let Some(value) = supplied {
        let value = value.trim().to_string();
        return if is_valid(&value) {
            Ok(value)
        } else {
            Err(invalid(key, &value, hint))
        };
    }

    if unattended {
        return Err(ProvisionError::ConfigValidationError {
            message: format!("{} is required in unattended mode", key.replace('_', " ")),
        });
    }

    let prompt = Prompt {
        key: key.to_string(),
        question: question.to_string(),
        prompt_type: PromptType::Input,
        default,
    };
    let mut last = String::new();
    for _ in 0..MAX_PROMPT_ATTEMPTS {
        last = ui.prompt(&prompt)?.as_string().trim().to_string();
        if is_valid(&last) {
            return Ok(last);
        }
        ui.error(&format!("Invalid {}: {}", key.replace('_', " "), hint));
    }
    Err(invalid(key, &last, hint))
}

fn invalid(key: &str, value: &str, hint: &str) -> ProvisionError {
    ProvisionError::ConfigValidationError {
        message: format!("Invalid {} '{}': {}", key.replace('_', " "), value, hint),
    }
}
