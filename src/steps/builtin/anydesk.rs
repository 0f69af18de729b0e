//! Open AnyDesk so the technician can note the machine's ID.

use std::path::PathBuf;

use tracing::info;

use crate::shell::Invocation;
use crate::steps::{StepDefinition, StepOutcome};

use super::{StepContext, ANYDESK};

/// Standard install locations.
pub fn default_paths() -> Vec<PathBuf> {
    let program_data =
        std::env::var("PROGRAMDATA").unwrap_or_else(|_| r"C:\ProgramData".to_string());
    vec![
        PathBuf::from(r"C:\Program Files (x86)\AnyDesk\AnyDesk.exe"),
        PathBuf::from(r"C:\Program Files\AnyDesk\AnyDesk.exe"),
        PathBuf::from(program_data).join("AnyDesk").join("AnyDesk.exe"),
    ]
}

pub fn step(configured: &[PathBuf], ctx: &StepContext) -> StepDefinition {
    let paths = if configured.is_empty() {
        default_paths()
    } else {
        configured.to_vec()
    };
    let ctx = ctx.clone();

    StepDefinition::new(ANYDESK, "Open AnyDesk", move || {
        let Some(exe) = paths
            .iter()
            .find(|p| ctx.probe.exists(&p.display().to_string()))
        else {
            return Ok(StepOutcome::warning("AnyDesk not found"));
        };

        info!("Opening {}", exe.display());
        Ok(
            match ctx
                .runner
                .spawn_detached(&Invocation::program(exe, Vec::<String>::new()))
            {
                Ok(()) => StepOutcome::Success,
                Err(e) => StepOutcome::warning(format!("AnyDesk did not start: {}", e)),
            },
        )
    })
    .with_detail("launch to collect the remote ID")
}
