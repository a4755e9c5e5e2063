//! Session bootstrap for CRM end-to-end suites.
//!
//! Every scenario in the suite starts from an authenticated browser session
//! and then creates records with values that must not collide across runs.
//! This crate provides the pieces that make that reliable:
//!
//! - [`SessionAuthenticator`]: logs in and completes the emailed
//!   verification-code challenge, retrying once with a fresh code
//! - [`CodeRetriever`]: polls a public webmail inbox in an auxiliary page
//!   and extracts the newest six-digit code
//! - [`DynamicFieldResolver`]: drives a form field that renders either as a
//!   text box or as a combobox
//! - [`UniqueValueGenerator`]: appends one run-scoped suffix to test values
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   fetch_code   ┌──────────────────┐
//! │ SessionAuthenticator │───────────────►│  CodeRetriever   │
//! └──────────┬───────────┘  (CodeSource)  └────────┬─────────┘
//!            │ PageDriver                          │ ContextFactory
//!            ▼                                     ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │   ChromiumPage / ChromiumBrowser  (or MockPage in tests) │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod auth;
#[allow(clippy::missing_errors_doc)]
mod browser;
mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
#[allow(clippy::missing_errors_doc)]
mod field;
#[allow(clippy::missing_errors_doc)]
mod inbox;
mod locator;
mod result;
mod retry;
mod unique;
mod wait;

pub use auth::{
    AuthOutcome, Credentials, LoginConfig, LoginState, SessionAuthenticator, MAX_CODE_SUBMISSIONS,
};
pub use browser::DriverConfig;
#[cfg(feature = "browser")]
pub use browser::{ChromiumBrowser, ChromiumPage};
pub use config::{
    credentials_from, credentials_from_env, E2eConfig, INBOX_URL_ENV, LOGIN_URL_ENV,
    PASSWORD_ENV, RECIPIENT_ENV, USERNAME_ENV,
};
pub use driver::{ContextFactory, MockContexts, MockPage, PageDriver};
pub use field::{
    select_option, DynamicFieldResolver, FieldConfig, OptionMatch, ResolvedField,
    DEFAULT_OPTION_SELECTOR, DEFAULT_PROBE_TIMEOUT_MS,
};
pub use inbox::{
    extract_code, CodeRetriever, CodeSource, Freshness, InboxConfig, VerificationCode, CODE_LENGTH,
};
pub use locator::{FieldLocatorPair, Locator, LocatorOptions, Selector};
pub use result::{
    AuthError, CodeRetrievalError, ConfigError, DriverError, DriverResult, FieldResolutionError,
};
pub use retry::RetryPolicy;
pub use unique::{unique_email, unique_value, RunSuffix, UniqueValueGenerator, RUN_SUFFIX_ENV};
pub use wait::WaitOptions;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        unique_email, unique_value, AuthError, AuthOutcome, CodeRetriever, CodeSource,
        Credentials, DynamicFieldResolver, E2eConfig, FieldLocatorPair, Freshness, Locator,
        PageDriver, ResolvedField, Selector, SessionAuthenticator, UniqueValueGenerator,
    };
}
