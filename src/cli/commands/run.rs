//! Run command implementation.
//!
//! The `provisioner run` command executes the install plan.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cli::args::RunArgs;
use crate::config::{OfficeEdition, Profile, ProvisionConfig};
use crate::error::Result;
use crate::runner::{LogSink, Orchestrator, Plan};
use crate::shell::{CancelHandle, SystemRunner};
use crate::steps::{install_steps, StepContext};
use crate::ui::{Prompt, PromptOption, PromptType, UserInterface};
use crate::updates::check_and_prompt_update;

use super::dispatcher::{find_profile, load_validated, Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    config_path: Option<PathBuf>,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(config_path: Option<&Path>, args: RunArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = load_validated(self.config_path.as_deref())?;
        let config = &loaded.config;
        let profile = find_profile(config, self.args.profile.as_deref())?;

        if ui.is_interactive() {
            match check_and_prompt_update(
                ui,
                config.update.network_dir.as_deref(),
                &SystemRunner::new(),
            ) {
                // The watcher script replaces us once we exit.
                Ok(true) => return Ok(CommandResult::success()),
                Ok(false) => {}
                Err(e) => warn!("Update failed: {:#}", e),
            }
        }

        let edition = choose_office_edition(config, &self.args, profile.as_ref(), ui)?;
        debug!("Office edition: {:?}", edition);

        let ctx = StepContext::system(config)?;
        let plan = build_install_plan(config, edition, &skip_list(&self.args, profile.as_ref()), &ctx)?;

        let mut orchestrator =
            Orchestrator::new(Box::new(LogSink)).with_cancel(CancelHandle::from_interrupts());
        let outcome = orchestrator.run(&plan, ui);

        Ok(CommandResult::from_run(&outcome))
    }
}

/// `--skip` plus the profile's skip list, without repeats.
pub fn skip_list(args: &RunArgs, profile: Option<&Profile>) -> Vec<String> {
    let mut skip: Vec<String> = Vec::new();
    let from_profile = profile.map(|p| p.skip_steps.as_slice()).unwrap_or_default();
    for id in args.skip.iter().chain(from_profile) {
        let id = id.trim();
        if !id.is_empty() && !skip.iter().any(|s| s == id) {
            skip.push(id.to_string());
        }
    }
    skip
}

/// Assemble the install plan; unknown skip ids are rejected here.
pub fn build_install_plan(
    config: &ProvisionConfig,
    edition: OfficeEdition,
    skip: &[String],
    ctx: &StepContext,
) -> Result<Plan> {
    install_steps(config, edition, ctx)
        .into_iter()
        .fold(Plan::builder(), |builder, step| builder.step(step))
        .skip(skip.iter().cloned())
        .build()
}

/// Flag, then profile, then a prompt before the run starts.
pub fn choose_office_edition(
    config: &ProvisionConfig,
    args: &RunArgs,
    profile: Option<&Profile>,
    ui: &mut dyn UserInterface,
) -> Result<OfficeEdition> {
    if let Some(edition) = args.office.or_else(|| profile.and_then(|p| p.office)) {
        return Ok(edition);
    }
    if config.office.is_empty() || args.skip.iter().any(|s| s == crate::steps::builtin::OFFICE) {
        return Ok(OfficeEdition::Skip);
    }
    if !ui.is_interactive() || args.non_interactive || profile.is_some() {
        // Unattended runs without a choice do not install Office.
        return Ok(OfficeEdition::Skip);
    }

    let mut options = Vec::new();
    if config.office.standard.is_some() {
        options.push(PromptOption {
            label: OfficeEdition::Standard.label().to_string(),
            value: "standard".to_string(),
        });
    }
    if config.office.subscription.is_some() {
        options.push(PromptOption {
            label: OfficeEdition::Subscription.label().to_string(),
            value: "subscription".to_string(),
        });
    }
    options.push(PromptOption {
        label: "Skip Office".to_string(),
        value: "none".to_string(),
    });

    let prompt = Prompt {
        key: "office_edition".to_string(),
        question: "Which Office edition should be installed?".to_string(),
        prompt_type: PromptType::Select { options },
        default: Some("none".to_string()),
    };
    let answer = ui.prompt(&prompt)?.as_string();

    Ok(match answer.as_str() {
        "standard" => OfficeEdition::Standard,
        "subscription" => OfficeEdition::Subscription,
        _ => OfficeEdition::Skip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstallerConfig;
    use crate::error::ProvisionError;
    use crate::steps::builtin::testing::{context, ScriptedRunner, SetProbe};
    use crate::ui::MockUI;
    use std::rc::Rc;

    fn office_config() -> ProvisionConfig {
        let mut config = ProvisionConfig::default();
        config.office.standard = Some(InstallerConfig {
            path: "setup.exe".into(),
            args: Vec::new(),
        });
        config
    }

    #[test]
    fn skip_list_merges_flag_and_profile() {
        let args = RunArgs {
            skip: vec!["office".into(), " anydesk ".into()],
            ..Default::default()
        };
        let profile = Profile {
            skip_steps: vec!["anydesk".into(), "shortcut".into()],
            ..Default::default()
        };

        assert_eq!(
            skip_list(&args, Some(&profile)),
            vec!["office", "anydesk", "shortcut"]
        );
    }

    #[test]
    fn unknown_skip_id_is_rejected() {
        let ctx = context(Rc::new(ScriptedRunner::default()), SetProbe::default());

        let err = build_install_plan(
            &ProvisionConfig::default(),
            OfficeEdition::Skip,
            &["printer".to_string()],
            &ctx,
        )
        .unwrap_err();

        assert!(matches!(err, ProvisionError::UnknownStep { ref id, .. } if id == "printer"));
    }

    #[test]
    fn office_flag_wins_over_profile() {
        let mut ui = MockUI::new();
        let args = RunArgs {
            office: Some(OfficeEdition::Subscription),
            ..Default::default()
        };
        let profile = Profile {
            office: Some(OfficeEdition::Standard),
            ..Default::default()
        };

        let edition =
            choose_office_edition(&office_config(), &args, Some(&profile), &mut ui).unwrap();

        assert_eq!(edition, OfficeEdition::Subscription);
    }

    #[test]
    fn interactive_run_prompts_for_office() {
        let mut ui = MockUI::new();
        ui.set_interactive(true);
        ui.set_prompt_response("office_edition", "standard");

        let edition =
            choose_office_edition(&office_config(), &RunArgs::default(), None, &mut ui).unwrap();

        assert_eq!(edition, OfficeEdition::Standard);
        assert_eq!(ui.prompts_shown(), ["office_edition".to_string()]);
    }

    #[test]
    fn unattended_run_without_choice_skips_office() {
        let mut ui = MockUI::new();

        let edition =
            choose_office_edition(&office_config(), &RunArgs::default(), None, &mut ui).unwrap();

        assert_eq!(edition, OfficeEdition::Skip);
        assert!(ui.prompts_shown().is_empty());
    }
}
