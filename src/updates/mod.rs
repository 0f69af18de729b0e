//! Self-update from the release share.
//!
//! This module provides:
//! - Version checking against `version.json` on the share
//! - Staging the new build and replacing the running executable
//! - Update prompting at the start of interactive runs

pub mod install;
pub mod prompt;
pub mod version;

pub use install::{apply_update, prepare_update, watcher_script, StagedUpdate};
pub use prompt::check_and_prompt_update;
pub use version::{
    check_for_updates, check_for_updates_in, is_newer_version, read_manifest, UpdateInfo,
    VersionManifest, MANIFEST_FILE, VERSION,
};
