//! The provisioning steps shipped with the tool.
//!
//! Each submodule turns a slice of [`ProvisionConfig`] into a
//! [`StepDefinition`] whose operation owns everything it needs. Process work
//! goes through the shared [`StepContext`], so tests swap in a scripted
//! runner and probe.

pub mod anydesk;
pub mod folders;
pub mod identity;
pub mod office;
pub mod packages;
pub mod shortcut;

use std::rc::Rc;

use crate::config::{OfficeEdition, ProvisionConfig, TimeoutSettings};
use crate::error::Result;
use crate::runner::{FsProbe, PathProbe, RetryPolicy};
use crate::shell::{CommandRunner, SystemRunner};

use super::StepDefinition;

pub const IDENTITY: &str = "identity";
pub const FOLDERS: &str = "folders";
pub const PACKAGES: &str = "packages";
pub const OFFICE: &str = "office";
pub const SHORTCUT: &str = "shortcut";
pub const ANYDESK: &str = "anydesk";

/// Install plan step ids, in execution order.
pub const INSTALL_STEP_IDS: [&str; 5] = [FOLDERS, PACKAGES, OFFICE, SHORTCUT, ANYDESK];

/// Collaborators shared by every built-in step.
#[derive(Clone)]
pub struct StepContext {
    pub runner: Rc<dyn CommandRunner>,
    pub probe: Rc<dyn PathProbe>,
    pub retry: RetryPolicy,
    pub timeouts: TimeoutSettings,
}

impl StepContext {
    /// Real processes and the real filesystem, with settings from `config`.
    pub fn system(config: &ProvisionConfig) -> Result<Self> {
        Ok(Self {
            runner: Rc::new(SystemRunner::new()),
            probe: Rc::new(FsProbe),
            retry: config.retry.policy()?,
            timeouts: config.timeouts.clone(),
        })
    }
}

/// Build the install plan steps in order.
pub fn install_steps(
    config: &ProvisionConfig,
    edition: OfficeEdition,
    ctx: &StepContext,
) -> Vec<StepDefinition> {
    vec![
        folders::step(&config.folders, ctx),
        packages::step(&config.packages, ctx),
        office::step(&config.office, edition, ctx),
        shortcut::step(config.webapp.as_ref(), config.chrome_path.as_deref(), ctx),
        anydesk::step(&config.anydesk_paths, ctx),
    ]
}
