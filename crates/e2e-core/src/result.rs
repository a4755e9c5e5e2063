//! Result and error types for the session bootstrap core.

use thiserror::Error;

/// Result type for browser driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by a [`PageDriver`](crate::PageDriver) implementation
#[derive(Debug, Error)]
pub enum DriverError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error (creating, closing, or talking to a page)
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched the selector
    #[error("No element matches {selector}")]
    ElementNotFound {
        /// Selector that matched nothing
        selector: String,
    },

    /// Script evaluation in the page failed
    #[error("Evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of [`SessionAuthenticator::login`](crate::SessionAuthenticator::login)
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login surface could not be driven up to the verification step
    #[error("Login failed: {message}")]
    LoginFailed {
        /// Error message
        message: String,
    },

    /// The verification code was rejected on every permitted submission
    #[error("Verification code rejected {attempts} times")]
    VerificationRejected {
        /// Number of codes submitted and rejected
        attempts: u8,
    },

    /// No verification code could be obtained for the challenge
    #[error("Could not obtain verification code: {0}")]
    CodeRetrieval(#[from] CodeRetrievalError),
}

impl AuthError {
    /// Create a login failure
    #[must_use]
    pub fn login_failed(message: impl Into<String>) -> Self {
        Self::LoginFailed {
            message: message.into(),
        }
    }
}

/// Failure of [`CodeRetriever`](crate::CodeRetriever) lookups
#[derive(Debug, Error)]
pub enum CodeRetrievalError {
    /// Every attempt finished without a six-digit code
    #[error("No verification code for {recipient} after {attempts} attempts")]
    NotFound {
        /// Inbox address searched
        recipient: String,
        /// Attempts made
        attempts: u32,
    },

    /// The webmail provider could not be opened or navigated
    #[error("Inbox unavailable: {message}")]
    InboxUnavailable {
        /// Error message
        message: String,
    },
}

impl CodeRetrievalError {
    /// Create an inbox-unavailable error
    #[must_use]
    pub fn inbox_unavailable(message: impl Into<String>) -> Self {
        Self::InboxUnavailable {
            message: message.into(),
        }
    }
}

/// Failure of [`DynamicFieldResolver`](crate::DynamicFieldResolver)
#[derive(Debug, Error)]
pub enum FieldResolutionError {
    /// Neither variant became visible within the probe timeout
    #[error("Field not present: neither {text} nor {combo} is visible")]
    NotPresent {
        /// Text variant selector
        text: String,
        /// Combobox variant selector
        combo: String,
    },

    /// Both variants are visible at the same time
    #[error("Ambiguous field: both {text} and {combo} are visible")]
    Ambiguous {
        /// Text variant selector
        text: String,
        /// Combobox variant selector
        combo: String,
    },

    /// The combobox opened but no option label matches the value
    #[error("No option matching {value:?} among {available:?}")]
    NoMatchingOption {
        /// Value requested
        value: String,
        /// Option labels that were rendered
        available: Vec<String>,
    },

    /// The resolved control could not be driven
    #[error("Field interaction failed: {0}")]
    Interaction(#[from] DriverError),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Required environment variable not set
    #[error("Environment variable {name} is not set")]
    MissingEnv {
        /// Variable name
        name: String,
    },
}
