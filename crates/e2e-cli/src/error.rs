//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] e2e_core::ConfigError),

    /// Login failed
    #[error("{0}")]
    Auth(#[from] e2e_core::AuthError),

    /// Verification code lookup failed
    #[error("{0}")]
    CodeRetrieval(#[from] e2e_core::CodeRetrievalError),

    /// Browser could not be driven
    #[error("Browser error: {0}")]
    Driver(#[from] e2e_core::DriverError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Command needs a feature this build lacks
    #[error("{command} requires the `{feature}` feature; rebuild with --features {feature}")]
    FeatureDisabled {
        /// Command name
        command: &'static str,
        /// Missing feature
        feature: &'static str,
    },
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_message() {
        let err: CliError = e2e_core::ConfigError::MissingEnv {
            name: "CRM_E2E_PASSWORD".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Environment variable CRM_E2E_PASSWORD is not set"
        );
    }

    #[test]
    fn test_auth_message_passthrough() {
        let err: CliError = e2e_core::AuthError::VerificationRejected { attempts: 2 }.into();
        assert_eq!(err.to_string(), "Verification code rejected 2 times");
    }

    #[test]
    fn test_feature_disabled_message() {
        let err = CliError::FeatureDisabled {
            command: "login",
            feature: "browser",
        };
        assert!(err.to_string().contains("--features browser"));
    }
}
