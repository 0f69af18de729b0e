//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Retry settings must allow at least one attempt
//! - Folder copies need both a source and a destination
//! - Profiles may only skip install steps that exist, each once
//! - Profile hostname, domain and admin user must be well formed

use crate::config::schema::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use crate::steps::builtin::identity::{
    is_valid_admin_user, is_valid_domain, is_valid_hostname, ADMIN_USER_HINT, DOMAIN_HINT,
    HOSTNAME_HINT,
};
use crate::steps::INSTALL_STEP_IDS;
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Profile name if error is profile-specific
    pub profile: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            profile: None,
        }
    }

    fn in_profile(rule: &str, profile: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message: format!("Profile '{}': {}", profile, message),
            profile: Some(profile.to_string()),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_retry(config));
    errors.extend(validate_folders(config));
    errors.extend(validate_identity_defaults(config));
    errors.extend(validate_profiles(config));

    errors
}

fn validate_retry(config: &ProvisionConfig) -> Vec<ValidationError> {
    if config.retry.max_attempts == 0 {
        vec![ValidationError::new(
            "retry-attempts",
            "retry.max_attempts must be at least 1".to_string(),
        )]
    } else {
        Vec::new()
    }
}

fn validate_folders(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (i, copy) in config.folders.iter().enumerate() {
        if copy.source.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "folder-source",
                format!("folders[{}] has an empty source", i),
            ));
        }
        if copy.destination.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "folder-destination",
                format!("folders[{}] has an empty destination", i),
            ));
        }
    }

    errors
}

fn validate_identity_defaults(config: &ProvisionConfig) -> Vec<ValidationError> {
    match &config.default_domain {
        Some(domain) if !is_valid_domain(domain) => vec![ValidationError::new(
            "domain-format",
            format!("default_domain '{}': {}", domain, DOMAIN_HINT),
        )],
        _ => Vec::new(),
    }
}

fn validate_profiles(config: &ProvisionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, profile) in &config.profiles {
        let mut seen = HashSet::new();
        for id in &profile.skip_steps {
            if !INSTALL_STEP_IDS.contains(&id.as_str()) {
                errors.push(ValidationError::in_profile(
                    "unknown-skip-step",
                    name,
                    format!(
                        "cannot skip unknown step '{}' (known: {})",
                        id,
                        INSTALL_STEP_IDS.join(", ")
                    ),
                ));
            } else if !seen.insert(id.as_str()) {
                errors.push(ValidationError::in_profile(
                    "duplicate-skip-step",
                    name,
                    format!("step '{}' is skipped twice", id),
                ));
            }
        }

        if let Some(hostname) = &profile.hostname {
            if !is_valid_hostname(hostname) {
                errors.push(ValidationError::in_profile(
                    "hostname-format",
                    name,
                    format!("hostname '{}': {}", hostname, HOSTNAME_HINT),
                ));
            }
        }
        if let Some(domain) = &profile.domain {
            if !is_valid_domain(domain) {
                errors.push(ValidationError::in_profile(
                    "domain-format",
                    name,
                    format!("domain '{}': {}", domain, DOMAIN_HINT),
                ));
            }
        }
        if let Some(user) = &profile.admin_user {
            if !is_valid_admin_user(user) {
                errors.push(ValidationError::in_profile(
                    "admin-user-format",
                    name,
                    format!("admin user '{}': {}", user, ADMIN_USER_HINT),
                ));
            }
        }
    }

    errors
}

/// Validate configuration, returning the first error as a Result.
///
/// For collecting all errors, use [`validate_config`] instead.
pub fn validate(config: &ProvisionConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(ProvisionError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{FolderCopy, Profile};

    fn with_profile(profile: Profile) -> ProvisionConfig {
        let mut config = ProvisionConfig::default();
        config.profiles.insert("lab".to_string(), profile);
        config
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&ProvisionConfig::default()).is_ok());
    }

    #[test]
    fn rejects_zero_attempts() {
        let mut config = ProvisionConfig::default();
        config.retry.max_attempts = 0;

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "retry-attempts"));
    }

    #[test]
    fn rejects_empty_folder_paths() {
        let mut config = ProvisionConfig::default();
        config.folders.push(FolderCopy {
            source: "".into(),
            destination: "".into(),
        });

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn rejects_unknown_and_duplicate_skip_steps() {
        let config = with_profile(Profile {
            skip_steps: vec!["office".into(), "office".into(), "printer".into()],
            ..Default::default()
        });

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "duplicate-skip-step"));
        assert!(errors
            .iter()
            .any(|e| e.rule == "unknown-skip-step" && e.message.contains("printer")));
        assert!(errors.iter().all(|e| e.profile.as_deref() == Some("lab")));
    }

    #[test]
    fn rejects_malformed_identity_fields() {
        let config = with_profile(Profile {
            hostname: Some("-bad-".into()),
            domain: Some("nodot".into()),
            admin_user: Some("two words".into()),
            ..Default::default()
        });

        let rules: Vec<String> = validate_config(&config)
            .into_iter()
            .map(|e| e.rule)
            .collect();
        assert_eq!(
            rules,
            vec!["hostname-format", "domain-format", "admin-user-format"]
        );
    }

    #[test]
    fn validate_joins_messages() {
        let mut config = with_profile(Profile {
            hostname: Some("-bad-".into()),
            ..Default::default()
        });
        config.retry.max_attempts = 0;

        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_attempts"));
        assert!(err.contains("Profile 'lab'"));
    }
}
