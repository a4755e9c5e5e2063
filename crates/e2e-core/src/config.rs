//! Suite configuration.
//!
//! Everything except credentials can live in a YAML file; every field has a
//! default, so an empty file is valid. A few deployment-specific values can
//! be overridden from the environment. Credentials are read only from the
//! environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::auth::{Credentials, LoginConfig};
use crate::browser::DriverConfig;
use crate::field::FieldConfig;
use crate::inbox::InboxConfig;
use crate::result::ConfigError;

/// Overrides `login.login_url`
pub const LOGIN_URL_ENV: &str = "CRM_E2E_LOGIN_URL";
/// Overrides `inbox.inbox_url`
pub const INBOX_URL_ENV: &str = "CRM_E2E_INBOX_URL";
/// Overrides `login.recipient_address`
pub const RECIPIENT_ENV: &str = "CRM_E2E_RECIPIENT";
/// Login username
pub const USERNAME_ENV: &str = "CRM_E2E_USERNAME";
/// Login password
pub const PASSWORD_ENV: &str = "CRM_E2E_PASSWORD";

/// Complete suite configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Login surface
    pub login: LoginConfig,
    /// Webmail inbox
    pub inbox: InboxConfig,
    /// Browser launch
    pub driver: DriverConfig,
    /// Dynamic field resolution
    pub field: FieldConfig,
}

impl E2eConfig {
    /// Parse a YAML document
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Render as YAML
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply overrides found through `lookup`
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = value(LOGIN_URL_ENV) {
            debug!(var = LOGIN_URL_ENV, "override applied");
            self.login.login_url = url;
        }
        if let Some(url) = value(INBOX_URL_ENV) {
            debug!(var = INBOX_URL_ENV, "override applied");
            self.inbox.inbox_url = url;
        }
        if let Some(recipient) = value(RECIPIENT_ENV) {
            debug!(var = RECIPIENT_ENV, "override applied");
            self.login.recipient_address = Some(recipient);
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }
}

/// Read credentials through `lookup`
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] naming the first unset variable
pub fn credentials_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credentials, ConfigError> {
    let require = |name: &str| {
        lookup(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv {
                name: name.to_string(),
            })
    };
    Ok(Credentials::new(
        require(USERNAME_ENV)?,
        require(PASSWORD_ENV)?,
    ))
}

/// Read credentials from the process environment
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] naming the first unset variable
pub fn credentials_from_env() -> Result<Credentials, ConfigError> {
    credentials_from(|name| std::env::var(name).ok())
}
