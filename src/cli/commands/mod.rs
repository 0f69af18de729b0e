//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`provisioner run`, `provisioner identity`)
//! - Shared configuration loading and validation
//! - One exit code contract for every command that runs a plan

pub mod completions;
pub mod diagnose;
pub mod dispatcher;
pub mod identity;
pub mod list;
pub mod run;
pub mod update;

pub use dispatcher::{
    Command, CommandDispatcher, CommandResult, EXIT_ABORTED, EXIT_FAILURE, EXIT_INTERRUPTED,
    EXIT_SUCCESS,
};
