//! Update prompting at the start of an interactive run.

use anyhow::Result;
use std::path::Path;

use super::{apply_update, check_for_updates, UpdateInfo};
use crate::shell::CommandRunner;
use crate::ui::{Prompt, PromptResult, UserInterface};

/// Check the share and offer the update.
///
/// Returns true if an update was staged; the caller should then exit.
pub fn check_and_prompt_update(
    ui: &mut dyn UserInterface,
    network_dir: Option<&Path>,
    runner: &dyn CommandRunner,
) -> Result<bool> {
    // Only check in interactive mode
    if !ui.is_interactive() {
        return Ok(false);
    }
    let Some(network_dir) = network_dir else {
        return Ok(false);
    };

    let info = match check_for_updates(network_dir) {
        Some(info) if info.update_available => info,
        _ => return Ok(false),
    };

    if !prompt_for_update(ui, &info)? {
        ui.message("Update skipped.");
        return Ok(false);
    }

    apply_update(&info, runner)?;
    ui.success(&format!(
        "Update {} prepared. Reopen the provisioner once the update window closes.",
        info.latest
    ));
    Ok(true)
}

/// Prompt the user to update.
fn prompt_for_update(ui: &mut dyn UserInterface, info: &UpdateInfo) -> Result<bool> {
    ui.message(&format!(
        "A new version of the provisioner is available: {} -> {}",
        info.current, info.latest
    ));

    if !info.executable.exists() {
        ui.warning(&format!(
            "Release file {} is missing from the share",
            info.executable.display()
        ));
        return Ok(false);
    }

    let prompt = Prompt::confirm("update_provisioner", "Update now?", true);
    match ui.prompt(&prompt)? {
        PromptResult::Bool(confirmed) => Ok(confirmed),
        _ => Ok(false),
    }
}
