//! Provisioner - post-install setup automation for Windows workstations.
//!
//! Provisioner turns a freshly imaged machine into a working desk: it copies
//! application folders from network shares, installs packages with winget,
//! runs the Office installer, creates the web-app shortcut and launches
//! AnyDesk. A separate command renames the machine and joins the domain.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`logging`] - Console and per-run log file setup
//! - [`runner`] - Retry, pre-flight and step orchestration
//! - [`shell`] - External process execution and host facts
//! - [`steps`] - Step definitions and the builtin provisioning steps
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`updates`] - Self-update from the release share
//!
//! # Example
//!
//! ```
//! use provisioner::runner::{Backoff, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3, Backoff::Linear(Duration::from_secs(2))).unwrap();
//! assert_eq!(policy.max_attempts(), 3);
//! assert_eq!(policy.backoff().delay(2), Duration::from_secs(4));
//! ```
//!
//! For end-to-end runs, see the integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;
pub mod updates;

pub use error::{ProvisionError, Result};
