//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// crm-e2e: session bootstrap utilities for the CRM end-to-end suite
#[derive(Parser, Debug)]
#[command(name = "crm-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "CRM_E2E_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, completing the emailed verification challenge if one appears
    ///
    /// Credentials are read from CRM_E2E_USERNAME and CRM_E2E_PASSWORD.
    Login(LoginArgs),

    /// Fetch the newest verification code from a webmail inbox
    Code(CodeArgs),

    /// Print a run-scoped unique value
    Unique(UniqueArgs),

    /// Show effective configuration
    Config,
}

/// Arguments for the login command
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the code command
#[derive(Parser, Debug)]
pub struct CodeArgs {
    /// Inbox address the code was sent to
    pub recipient: String,

    /// Attempts before giving up (defaults to the configured budget)
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the unique command
#[derive(Parser, Debug)]
pub struct UniqueArgs {
    /// Base value
    pub base: String,

    /// Treat the base as an email address and keep its domain
    #[arg(long)]
    pub email: bool,

    /// Use this suffix instead of the run suffix
    #[arg(long)]
    pub suffix: Option<String>,
}

/// Color output argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
