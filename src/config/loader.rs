//! Configuration file discovery and loading.
//!
//! Lookup order:
//! 1. An explicit `--config` path (must exist)
//! 2. `provisioner.yml` next to the executable (the network share layout)
//! 3. `provisioner.yml` in the working directory
//!
//! When nothing is found the built-in defaults are used: every install step
//! then reports that it has nothing to do.

use crate::config::schema::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up next to the executable and in the working directory.
pub const CONFIG_FILE_NAME: &str = "provisioner.yml";

/// A parsed configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: ProvisionConfig,
    /// `None` when the built-in defaults are in use.
    pub path: Option<PathBuf>,
}

/// Candidate locations in lookup order.
pub fn candidate_paths(exe_dir: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for dir in [exe_dir, cwd].into_iter().flatten() {
        let path = dir.join(CONFIG_FILE_NAME);
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates
}

/// Find the configuration file to use, if any.
pub fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ProvisionError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();

    Ok(candidate_paths(exe_dir.as_deref(), cwd.as_deref())
        .into_iter()
        .find(|p| p.is_file()))
}

/// Discover and load the configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    match discover(explicit)? {
        Some(path) => {
            let config = load_config_file(&path)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(LoadedConfig {
                config,
                path: Some(path),
            })
        }
        None => {
            tracing::debug!("No {} found; using built-in defaults", CONFIG_FILE_NAME);
            Ok(LoadedConfig::default())
        }
    }
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<ProvisionConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProvisionError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ProvisionError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content; `source_path` is only used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ProvisionConfig> {
    // An empty file is a valid, empty configuration.
    if content.trim().is_empty() {
        return Ok(ProvisionConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| ProvisionError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
