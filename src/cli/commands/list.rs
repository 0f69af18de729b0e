//! List command implementation.
//!
//! The `provisioner list` command shows the install plan without running it.

use std::path::{Path, PathBuf};

use crate::cli::args::{ListArgs, RunArgs};
use crate::config::OfficeEdition;
use crate::error::Result;
use crate::steps::StepContext;
use crate::ui::UserInterface;

use super::dispatcher::{find_profile, load_validated, Command, CommandResult};
use super::run::{build_install_plan, skip_list};

/// The list command implementation.
pub struct ListCommand {
    config_path: Option<PathBuf>,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(config_path: Option<&Path>, args: ListArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = load_validated(self.config_path.as_deref())?;
        let config = &loaded.config;
        let profile = find_profile(config, self.args.profile.as_deref())?;

        // Show the standard installer unless the profile says otherwise.
        let edition = profile
            .as_ref()
            .and_then(|p| p.office)
            .unwrap_or(if config.office.standard.is_some() {
                OfficeEdition::Standard
            } else {
                OfficeEdition::Subscription
            });
        let skip = skip_list(&RunArgs::default(), profile.as_ref());
        let ctx = StepContext::system(config)?;
        let plan = build_install_plan(config, edition, &skip, &ctx)?;

        if self.args.json {
            let steps: Vec<serde_json::Value> = plan
                .steps()
                .iter()
                .map(|step| {
                    serde_json::json!({
                        "id": step.id(),
                        "label": step.label(),
                        "detail": step.detail(),
                        "skipped": plan.is_skipped(step.id()),
                        "preflight_paths": step.preflight_paths(),
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "config": loaded.path.as_ref().map(|p| p.display().to_string()),
                "steps": steps,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&doc).map_err(anyhow::Error::from)?
            );
            return Ok(CommandResult::success());
        }

        match &loaded.path {
            Some(path) => ui.message(&format!("Configuration: {}", path.display())),
            None => ui.message("Configuration: built-in defaults"),
        }
        ui.show_plan(&plan.summary());

        let paths = plan.preflight_paths();
        if !paths.is_empty() {
            ui.message("Network paths checked before the run:");
            for path in paths {
                ui.message(&format!("  {}", path));
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_plan_and_preflight_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("provisioner.yml");
        fs::write(
            &path,
            "folders:\n  - source: /share/apps\n    destination: /opt/apps\nprofiles:\n  lab:\n    skip_steps: [anydesk]\n",
        )
        .unwrap();
        let mut ui = MockUI::new();
        let cmd = ListCommand::new(
            Some(&path),
            ListArgs {
                profile: Some("lab".into()),
                json: false,
            },
        );

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        let plan = &ui.plans()[0];
        assert_eq!(plan.len(), 5);
        assert!(plan.iter().any(|e| e.id == "anydesk" && e.skipped));
        assert!(ui.has_message("/share/apps"));
    }

    #[test]
    fn invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("provisioner.yml");
        fs::write(&path, "retry:\n  max_attempts: 0\n").unwrap();
        let mut ui = MockUI::new();

        let result = ListCommand::new(Some(&path), ListArgs::default()).execute(&mut ui);

        assert!(result.is_err());
    }
}
