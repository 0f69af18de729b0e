//! External process execution and host facts.

pub mod command;
pub mod interrupt;
pub mod platform;

pub use command::{
    CommandOptions, CommandResult, CommandRunner, Invocation, SystemRunner, NO_EXIT_CODE,
};
pub use interrupt::{install_handler, CancelHandle};
pub use platform::{hostname, is_ci, is_elevated};
