#![forbid(unsafe_code)]

//! Command-line harness for the tabledrag engine.
//!
//! `tabledrag replay` drives a scripted pointer session through the drag
//! recognizer, a uniform row strip, and the engine, then reports every
//! commit and veto. `tabledrag check` runs a validator chain over a row list
//! and exits with status 2 when it is rejected. `tabledrag render` prints a
//! row list as an indented tree.

pub mod cli;
pub mod driver;
pub mod error;
pub mod logging;
pub mod render;
pub mod scenario;

pub use cli::{Cli, Commands, run, run_from_env};
pub use driver::{Driver, Report, Step, replay};
pub use error::{HarnessError, Result};
pub use render::TextRenderer;
pub use scenario::Scenario;
