//! crm-e2e CLI library
//!
//! Operator commands over the session bootstrap core: a login smoke check,
//! a one-off inbox lookup, unique value generation, and a dump of the
//! effective configuration.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{Cli, CodeArgs, ColorArg, Commands, LoginArgs, UniqueArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Reporter;
