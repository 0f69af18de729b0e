//! Provisioning steps.
//!
//! - [`StepOutcome`] - How a step ended
//! - [`StepDefinition`] - A named operation plus its plan metadata
//! - [`builtin`] - The steps this tool ships with
//!
//! # Example
//!
//! ```
//! use provisioner::steps::{StepDefinition, StepOutcome};
//!
//! let step = StepDefinition::new("hello", "Say hello", || {
//!     Ok(StepOutcome::warning("nobody listened"))
//! });
//!
//! assert_eq!(step.run().unwrap().status(), "warning");
//! ```

pub mod builtin;
pub mod definition;
pub mod outcome;

pub use builtin::{install_steps, StepContext, INSTALL_STEP_IDS};
pub use definition::{StepDefinition, StepOperation};
pub use outcome::StepOutcome;
