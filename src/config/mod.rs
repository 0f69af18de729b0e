//! Configuration loading, parsing, and validation.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use provisioner::config::{parse_config, validate};
//! use std::path::Path;
//!
//! let yaml = "default_domain: corp.local\npackages: [Google.Chrome]\n";
//! let config = parse_config(yaml, Path::new("provisioner.yml")).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.packages, vec!["Google.Chrome".to_string()]);
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

// Schema re-exports
pub use schema::{
    FolderCopy, InstallerConfig, LoggingSettings, OfficeConfig, OfficeEdition, Profile,
    ProvisionConfig, RetrySettings, ShortcutLocation, TimeoutSettings, UpdateSettings,
    WebAppConfig,
};

// Loader re-exports
pub use loader::{
    candidate_paths, discover, load_config, load_config_file, parse_config, LoadedConfig,
    CONFIG_FILE_NAME,
};

// Validator re-exports
pub use validator::{validate, validate_config, ValidationError};
