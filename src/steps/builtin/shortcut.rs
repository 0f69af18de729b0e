//! Chrome `--app` shortcut for the intranet web application.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{ShortcutLocation, WebAppConfig};
use crate::shell::{CommandOptions, Invocation};
use crate::steps::{StepDefinition, StepOutcome};

use super::{StepContext, SHORTCUT};

const CHROME_ALTERNATES: [&str; 2] = [
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

pub fn step(
    webapp: Option<&WebAppConfig>,
    chrome_path: Option<&Path>,
    ctx: &StepContext,
) -> StepDefinition {
    let webapp = webapp.cloned();
    let chrome_path = chrome_path.map(Path::to_path_buf);
    let ctx = ctx.clone();
    let detail = match &webapp {
        Some(app) => format!("{} -> {}", app.name, app.url),
        None => "nothing configured".to_string(),
    };

    StepDefinition::new(SHORTCUT, "Create web app shortcut", move || {
        Ok(match &webapp {
            Some(app) => create(app, chrome_path.as_deref(), &ctx),
            None => StepOutcome::skipped("no web app configured"),
        })
    })
    .with_detail(detail)
}

/// The configured path first, then the standard install locations.
pub fn chrome_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = configured.map(Path::to_path_buf).into_iter().collect();
    for alt in CHROME_ALTERNATES {
        let alt = PathBuf::from(alt);
        if !candidates.contains(&alt) {
            candidates.push(alt);
        }
    }
    candidates
}

/// Folder the `.lnk` file goes into.
pub fn shortcut_dir(location: ShortcutLocation) -> PathBuf {
    match location {
        ShortcutLocation::Desktop => {
            let public = std::env::var("PUBLIC").unwrap_or_else(|_| r"C:\Users\Public".to_string());
            PathBuf::from(public).join("Desktop")
        }
        ShortcutLocation::StartMenu => {
            let data =
                std::env::var("PROGRAMDATA").unwrap_or_else(|_| r"C:\ProgramData".to_string());
            PathBuf::from(data)
                .join("Microsoft")
                .join("Windows")
                .join("Start Menu")
                .join("Programs")
        }
    }
}

/// PowerShell that writes the `.lnk` through `WScript.Shell`.
pub fn shortcut_script(shortcut: &Path, chrome: &Path, app: &WebAppConfig) -> String {
    let working_dir = chrome.parent().unwrap_or_else(|| Path::new(""));
    format!(
        "$shell = New-Object -ComObject WScript.Shell\n\
         $lnk = $shell.CreateShortcut('{}')\n\
         $lnk.TargetPath = '{}'\n\
         $lnk.Arguments = '--app={}'\n\
         $lnk.WorkingDirectory = '{}'\n\
         $lnk.Description = '{}'\n\
         $lnk.Save()",
        ps_quote(&shortcut.display().to_string()),
        ps_quote(&chrome.display().to_string()),
        ps_quote(&app.url),
        ps_quote(&working_dir.display().to_string()),
        ps_quote(&app.name),
    )
}

/// Escape for a single-quoted PowerShell string.
fn ps_quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn create(app: &WebAppConfig, configured: Option<&Path>, ctx: &StepContext) -> StepOutcome {
    let candidates = chrome_candidates(configured);
    let Some(chrome) = candidates
        .iter()
        .find(|p| ctx.probe.exists(&p.display().to_string()))
    else {
        warn!("Chrome not found in any known location");
        return StepOutcome::failed("prerequisite missing: Chrome is not installed");
    };

    let shortcut = shortcut_dir(app.location).join(format!("{}.lnk", app.name));
    info!("Creating shortcut {} -> {}", shortcut.display(), app.url);

    let script = shortcut_script(&shortcut, chrome, app);
    match ctx
        .runner
        .run(&Invocation::powershell(script), &CommandOptions::captured())
    {
        Ok(result) if result.success() => StepOutcome::Success,
        Ok(result) => StepOutcome::failed(format!(
            "could not write {}: {}",
            shortcut.display(),
            result.combined_output()
        )),
        Err(e) => StepOutcome::failed(e.to_string()),
    }
}
