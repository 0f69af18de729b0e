//! Version checking against the release share.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current version of the provisioner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Manifest published next to each release on the share.
pub const MANIFEST_FILE: &str = "version.json";

/// Contents of `version.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    pub latest_version: String,
    /// File name of the released executable, relative to the share.
    pub exe_filename: String,
}

/// Information about an available update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Current version.
    pub current: String,
    /// Latest published version.
    pub latest: String,
    /// Full path of the released executable.
    pub executable: PathBuf,
    /// Whether the published version is newer.
    pub update_available: bool,
}

/// Read and parse the manifest in `network_dir`.
pub fn read_manifest(network_dir: &Path) -> Result<VersionManifest> {
    let path = network_dir.join(MANIFEST_FILE);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Compare the share against [`VERSION`].
pub fn check_for_updates_in(network_dir: &Path, current: &str) -> Result<UpdateInfo> {
    let manifest = read_manifest(network_dir)?;
    if manifest.exe_filename.trim().is_empty() {
        anyhow::bail!("{} does not name an executable", MANIFEST_FILE);
    }

    Ok(UpdateInfo {
        current: current.to_string(),
        update_available: is_newer_version(&manifest.latest_version, current),
        latest: manifest.latest_version,
        executable: network_dir.join(&manifest.exe_filename),
    })
}

/// Check for an update, staying silent when the share is unavailable.
pub fn check_for_updates(network_dir: &Path) -> Option<UpdateInfo> {
    match check_for_updates_in(network_dir, VERSION) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::debug!("Update check skipped: {:#}", e);
            None
        }
    }
}

/// Compare versions to check if `latest` is newer than `current`.
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    let parse_version = |v: &str| -> Vec<u32> {
        v.trim_start_matches('v')
            .split('.')
            .take(3)
            .filter_map(|s| s.parse().ok())
            .collect()
    };

    let latest_parts = parse_version(latest);
    let current_parts = parse_version(current);

    // Compare component by component
    for (l, c) in latest_parts.iter().zip(current_parts.iter()) {
        if l > c {
            return true;
        }
        if l < c {
            return false;
        }
    }

    // If all components equal, check if latest has more components
    latest_parts.len() > current_parts.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn share(manifest: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), manifest).unwrap();
        temp
    }

    #[test]
    fn is_newer_version_basic() {
        assert!(is_newer_version("1.1.0", "1.0.0"));
        assert!(is_newer_version("2.0.0", "1.9.9"));
        assert!(is_newer_version("v1.0.1", "1.0.0"));
    }

    #[test]
    fn is_newer_version_same_or_older() {
        assert!(!is_newer_version("1.0.0", "1.0.0"));
        assert!(!is_newer_version("0.9.0", "1.0.0"));
    }

    #[test]
    fn is_newer_version_with_two_components() {
        assert!(is_newer_version("1.1", "1.0"));
        assert!(!is_newer_version("1.0", "1.1"));
    }

    #[test]
    fn is_newer_version_invalid_format() {
        assert!(!is_newer_version("abc", "0.1.0"));
        assert!(is_newer_version("0.1.0", "abc"));
    }

    #[test]
    fn newer_manifest_reports_update() {
        let temp = share(r#"{"latest_version": "1.2.0", "exe_filename": "Provisioner.exe"}"#);

        let info = check_for_updates_in(temp.path(), "1.1.0").unwrap();

        assert!(info.update_available);
        assert_eq!(info.latest, "1.2.0");
        assert_eq!(info.executable, temp.path().join("Provisioner.exe"));
    }

    #[test]
    fn same_version_reports_no_update() {
        let temp = share(r#"{"latest_version": "1.1.0", "exe_filename": "Provisioner.exe"}"#);
        assert!(!check_for_updates_in(temp.path(), "1.1.0").unwrap().update_available);
    }

    #[test]
    fn missing_share_is_silent() {
        let temp = TempDir::new().unwrap();
        assert!(check_for_updates(&temp.path().join("offline")).is_none());
    }

    #[test]
    fn malformed_manifest_is_error() {
        let temp = share("{not json");
        let err = check_for_updates_in(temp.path(), "1.0.0").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }

    #[test]
    fn empty_exe_name_is_error() {
        let temp = share(r#"{"latest_version": "9.0.0", "exe_filename": " "}"#);
        assert!(check_for_updates_in(temp.path(), "1.0.0").is_err());
    }
}
