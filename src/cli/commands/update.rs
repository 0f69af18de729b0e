//! Update command implementation.
//!
//! The `provisioner update` command replaces this executable with the build
//! published on the release share.

use std::path::{Path, PathBuf};

use crate::cli::args::UpdateArgs;
use crate::error::{ProvisionError, Result};
use crate::shell::SystemRunner;
use crate::ui::UserInterface;
use crate::updates::{apply_update, check_for_updates_in, VERSION};

use super::dispatcher::{load_validated, Command, CommandResult};

/// The update command implementation.
pub struct UpdateCommand {
    config_path: Option<PathBuf>,
    args: UpdateArgs,
}

impl UpdateCommand {
    /// Create a new update command.
    pub fn new(config_path: Option<&Path>, args: UpdateArgs) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }
}

impl Command for UpdateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = load_validated(self.config_path.as_deref())?;
        let Some(network_dir) = loaded.config.update.network_dir.as_deref() else {
            return Err(ProvisionError::UpdateFailed {
                message: "update.network_dir is not configured".to_string(),
            });
        };

        let info = check_for_updates_in(network_dir, VERSION).map_err(|e| {
            ProvisionError::UpdateFailed {
                message: format!("{:#}", e),
            }
        })?;

        if !info.update_available {
            ui.success(&format!("Already up to date ({})", info.current));
            return Ok(CommandResult::success());
        }

        ui.message(&format!("Update available: {} -> {}", info.current, info.latest));
        if self.args.check {
            return Ok(CommandResult::success());
        }

        let staged = apply_update(&info, &SystemRunner::new()).map_err(|e| {
            ProvisionError::UpdateFailed {
                message: format!("{:#}", e),
            }
        })?;
        tracing::debug!("Watcher script: {}", staged.script.display());
        ui.success(&format!(
            "Update {} prepared. It is applied as soon as this window closes.",
            info.latest
        ));
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn config_with_share(temp: &TempDir, share: &Path) -> PathBuf {
        let path = temp.path().join("provisioner.yml");
        fs::write(
            &path,
            format!("update:\n  network_dir: '{}'\n", share.display()),
        )
        .unwrap();
        path
    }

    #[test]
    fn missing_network_dir_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("provisioner.yml");
        fs::write(&path, "packages: []\n").unwrap();
        let mut ui = MockUI::new();

        let err = UpdateCommand::new(Some(&path), UpdateArgs::default())
            .execute(&mut ui)
            .unwrap_err();

        assert!(err.to_string().contains("network_dir"));
    }

    #[test]
    fn check_reports_available_update_without_applying() {
        let temp = TempDir::new().unwrap();
        let share = temp.path().join("share");
        fs::create_dir_all(&share).unwrap();
        fs::write(
            share.join("version.json"),
            r#"{"latest_version": "999.0.0", "exe_filename": "Provisioner.exe"}"#,
        )
        .unwrap();
        let path = config_with_share(&temp, &share);
        let mut ui = MockUI::new();

        let result = UpdateCommand::new(Some(&path), UpdateArgs { check: true })
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_message("-> 999.0.0"));
    }

    #[test]
    fn current_version_is_up_to_date() {
        let temp = TempDir::new().unwrap();
        let share = temp.path().join("share");
        fs::create_dir_all(&share).unwrap();
        fs::write(
            share.join("version.json"),
            format!(r#"{{"latest_version": "{}", "exe_filename": "p.exe"}}"#, VERSION),
        )
        .unwrap();
        let path = config_with_share(&temp, &share);
        let mut ui = MockUI::new();

        UpdateCommand::new(Some(&path), UpdateArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(ui.has_success("Already up to date"));
    }
}
