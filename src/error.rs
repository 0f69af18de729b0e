//! Error types for provisioning operations.
//!
//! This module defines [`ProvisionError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `ProvisionError` for faults that need distinct handling (bad config,
//!   a program that cannot be spawned, an invalid plan)
//! - A non-zero exit code is *not* an error: it is data in a
//!   [`CommandResult`](crate::shell::CommandResult) that the caller interprets
//! - Step operations return `anyhow::Result<StepOutcome>`; an `Err` there is
//!   converted into a `Failed` report row by the orchestrator

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Two steps were registered under the same id.
    #[error("Duplicate step id: {id}")]
    DuplicateStep { id: String },

    /// A skip list or profile referenced a step that is not in the plan.
    #[error("Unknown step '{id}' (known steps: {known})")]
    UnknownStep { id: String, known: String },

    /// The interpreter or executable could not be located or spawned.
    #[error("Could not start '{program}': {message}")]
    RunnerError { program: String, message: String },

    /// Applying a self-update failed.
    #[error("Update failed: {message}")]
    UpdateFailed { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = ProvisionError::ConfigNotFound {
            path: PathBuf::from("C:/tools/provisioner.yml"),
        };
        assert!(err.to_string().contains("provisioner.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = ProvisionError::ConfigParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn duplicate_step_displays_id() {
        let err = ProvisionError::DuplicateStep {
            id: "packages".into(),
        };
        assert!(err.to_string().contains("packages"));
    }

    #[test]
    fn unknown_step_lists_known_ids() {
        let err = ProvisionError::UnknownStep {
            id: "ofice".into(),
            known: "folders, office".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ofice"));
        assert!(msg.contains("folders, office"));
    }

    #[test]
    fn runner_error_displays_program_and_message() {
        let err = ProvisionError::RunnerError {
            program: "powershell.exe".into(),
            message: "program not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("powershell.exe"));
        assert!(msg.contains("program not found"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ProvisionError = io_err.into();
        assert!(matches!(err, ProvisionError::Io(_)));
    }

    #[test]
    fn anyhow_error_is_transparent() {
        let err: ProvisionError = anyhow::anyhow!("share offline").into();
        assert_eq!(err.to_string(), "share offline");
    }
}
