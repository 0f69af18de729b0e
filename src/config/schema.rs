//! Configuration schema definitions.
//!
//! This module contains the struct definitions that map to the
//! `provisioner.yml` file format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::runner::{Backoff, RetryPolicy};

/// Root configuration structure for `provisioner.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Domain joined when neither a flag nor a profile names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_domain: Option<String>,

    /// Network folders mirrored onto the local disk.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<FolderCopy>,

    /// winget package ids, installed in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,

    /// Office installers by edition.
    pub office: OfficeConfig,

    /// Chrome `--app` shortcut.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webapp: Option<WebAppConfig>,

    /// Preferred Chrome location; well-known install paths are tried after it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Where to look for AnyDesk (well-known paths when empty).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anydesk_paths: Vec<PathBuf>,

    pub retry: RetrySettings,

    pub timeouts: TimeoutSettings,

    pub logging: LoggingSettings,

    pub update: UpdateSettings,

    /// Named parameter sets for unattended runs.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Profile>,
}

impl ProvisionConfig {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }
}

/// One `{source, destination}` folder copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCopy {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// An installer executable and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerConfig {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Office installers; either edition may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<InstallerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<InstallerConfig>,
}

impl OfficeConfig {
    /// Installer for an edition (`None` for [`OfficeEdition::Skip`]).
    pub fn installer(&self, edition: OfficeEdition) -> Option<&InstallerConfig> {
        match edition {
            OfficeEdition::Standard => self.standard.as_ref(),
            OfficeEdition::Subscription => self.subscription.as_ref(),
            OfficeEdition::Skip => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_none() && self.subscription.is_none()
    }
}

/// Which Office edition to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OfficeEdition {
    /// Volume-licensed standard edition.
    Standard,
    /// Subscription (Microsoft 365) edition.
    Subscription,
    /// Do not install Office.
    #[serde(rename = "none")]
    #[value(name = "none")]
    Skip,
}

impl OfficeEdition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Office (standard)",
            Self::Subscription => "Office (subscription)",
            Self::Skip => "no Office",
        }
    }
}

/// Where the web app shortcut is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutLocation {
    /// The Public desktop (all users).
    #[default]
    Desktop,
    /// The all-users Start Menu programs folder.
    StartMenu,
}

/// Chrome `--app` shortcut settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppConfig {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub location: ShortcutLocation,
}

/// Retry settings for flaky sub-operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    /// Linear backoff step: attempt `n` waits `n * backoff_seconds`.
    pub backoff_seconds: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_seconds: 2,
        }
    }
}

impl RetrySettings {
    /// Build the policy these settings describe.
    pub fn policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.max_attempts,
            Backoff::Linear(Duration::from_secs(self.backoff_seconds)),
        )
    }
}

/// Per-process timeouts, in seconds. Zero disables the timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub package_seconds: u64,
    pub installer_seconds: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            package_seconds: 30 * 60,
            installer_seconds: 60 * 60,
        }
    }
}

impl TimeoutSettings {
    pub fn package(&self) -> Option<Duration> {
        non_zero_secs(self.package_seconds)
    }

    pub fn installer(&self) -> Option<Duration> {
        non_zero_secs(self.installer_seconds)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Log file settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for `provisioning_<HOST>_<timestamp>.log` files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Self-update settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// Share holding `version.json` and the released executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_dir: Option<PathBuf>,
}

/// Unattended parameters selected with `--profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Install steps excluded from the run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skip_steps: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,

    /// Reboot after a successful domain join.
    pub auto_reboot: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub office: Option<OfficeEdition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: ProvisionConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.packages.is_empty());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff_seconds, 2);
        assert_eq!(config.timeouts.package(), Some(Duration::from_secs(1800)));
        assert!(config.office.is_empty());
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
default_domain: corp.local
folders:
  - source: '\\srv\apps\client'
    destination: 'C:\Client'
packages: [Google.Chrome, RARLab.WinRAR]
office:
  standard:
    path: '\\srv\office\setup.exe'
    args: [/configure, configuration.xml]
  subscription:
    path: '\\srv\office365\OfficeSetup.exe'
webapp:
  url: http://intranet
  name: Intranet
  location: start_menu
retry:
  max_attempts: 5
  backoff_seconds: 1
timeouts:
  installer_seconds: 0
update:
  network_dir: '\\srv\provisioner'
profiles:
  lab:
    skip_steps: [office, anydesk]
    hostname: LAB-01
    admin_user: CORP\admin
    auto_reboot: true
    office: none
"#;
        let config: ProvisionConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.default_domain.as_deref(), Some("corp.local"));
        assert_eq!(config.folders.len(), 1);
        assert_eq!(config.packages, vec!["Google.Chrome", "RARLab.WinRAR"]);
        let standard = config.office.installer(OfficeEdition::Standard).unwrap();
        assert_eq!(standard.args, vec!["/configure", "configuration.xml"]);
        assert!(config
            .office
            .installer(OfficeEdition::Subscription)
            .unwrap()
            .args
            .is_empty());
        assert_eq!(
            config.webapp.as_ref().unwrap().location,
            ShortcutLocation::StartMenu
        );
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.timeouts.installer(), None);

        let lab = config.profile("lab").unwrap();
        assert_eq!(lab.skip_steps, vec!["office", "anydesk"]);
        assert_eq!(lab.office, Some(OfficeEdition::Skip));
        assert!(lab.auto_reboot);
        assert!(lab.domain.is_none());
    }

    #[test]
    fn webapp_location_defaults_to_desktop() {
        let web: WebAppConfig = serde_yaml::from_str("url: http://x\nname: X").unwrap();
        assert_eq!(web.location, ShortcutLocation::Desktop);
    }

    #[test]
    fn retry_settings_build_policy() {
        let policy = RetrySettings::default().policy().unwrap();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff(), Backoff::Linear(Duration::from_secs(2)));

        let invalid = RetrySettings {
            max_attempts: 0,
            backoff_seconds: 1,
        };
        assert!(invalid.policy().is_err());
    }
}
