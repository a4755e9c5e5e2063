//! Command handlers

use std::path::Path;

use e2e_core::{E2eConfig, RunSuffix, UniqueValueGenerator};

use crate::commands::UniqueArgs;
use crate::error::{CliError, CliResult};

/// Load configuration from `path` (or defaults) and apply environment overrides
pub fn load_config(path: Option<&Path>) -> CliResult<E2eConfig> {
    let config = match path {
        Some(path) => E2eConfig::load(path)?,
        None => E2eConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Effective configuration as YAML
pub fn render_config(config: &E2eConfig) -> CliResult<String> {
    Ok(config.to_yaml()?)
}

/// Value printed by `unique`
pub fn unique(args: &UniqueArgs) -> CliResult<String> {
    let generator = match &args.suffix {
        Some(raw) => {
            let suffix = RunSuffix::new(raw);
            if suffix.as_str().is_empty() {
                return Err(CliError::invalid_argument(format!(
                    "suffix {raw:?} has no letters or digits"
                )));
            }
            UniqueValueGenerator::new(suffix)
        }
        None => UniqueValueGenerator::for_run(),
    };
    Ok(if args.email {
        generator.unique_email(&args.base)
    } else {
        generator.unique_value(&args.base)
    })
}

#[cfg(feature = "browser")]
mod browser {
    use e2e_core::{
        credentials_from_env, AuthOutcome, ChromiumBrowser, CodeRetriever, E2eConfig,
        SessionAuthenticator, VerificationCode,
    };
    use tracing::warn;

    use crate::commands::{CodeArgs, LoginArgs};
    use crate::error::{CliError, CliResult};

    async fn launch(config: &E2eConfig, headed: bool) -> CliResult<ChromiumBrowser> {
        let mut driver = config.driver.clone();
        if headed {
            driver = driver.with_headless(false);
        }
        Ok(ChromiumBrowser::launch(driver).await?)
    }

    async fn shutdown(browser: ChromiumBrowser) {
        if let Err(err) = browser.close().await {
            warn!(error = %err, "browser did not close cleanly");
        }
    }

    /// Log in with credentials from the environment
    pub async fn login(config: &E2eConfig, args: &LoginArgs) -> CliResult<AuthOutcome> {
        let credentials = credentials_from_env()?;
        let browser = launch(config, args.headed).await?;
        let outcome = async {
            let mut page = browser.new_page().await?;
            let retriever = CodeRetriever::new(browser.clone(), config.inbox.clone());
            let mut auth = SessionAuthenticator::new(config.login.clone(), retriever);
            Ok::<_, CliError>(auth.login(&mut page, &credentials).await?)
        }
        .await;
        shutdown(browser).await;
        outcome
    }

    /// Newest code in the recipient's inbox
    pub async fn code(config: &E2eConfig, args: &CodeArgs) -> CliResult<VerificationCode> {
        let browser = launch(config, args.headed).await?;
        let attempts = args.attempts.unwrap_or(config.inbox.retry.max_attempts);
        let mut retriever = CodeRetriever::new(browser.clone(), config.inbox.clone());
        let code = retriever
            .fetch_latest_code(&args.recipient, attempts)
            .await
            .map_err(CliError::from);
        shutdown(browser).await;
        code
    }
}

#[cfg(feature = "browser")]
pub use browser::{code, login};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(base: &str, email: bool, suffix: Option<&str>) -> UniqueArgs {
        UniqueArgs {
            base: base.to_string(),
            email,
            suffix: suffix.map(str::to_string),
        }
    }

    mod unique_tests {
        use super::*;

        #[test]
        fn test_value_with_explicit_suffix() {
            assert_eq!(unique(&args("Acme", false, Some("R1"))).unwrap(), "Acme_r1");
        }

        #[test]
        fn test_email_with_explicit_suffix() {
            assert_eq!(
                unique(&args("qa@example.com", true, Some("r1"))).unwrap(),
                "qa_r1@example.com"
            );
        }

        #[test]
        fn test_run_suffix_is_stable() {
            let first = unique(&args("Lead", false, None)).unwrap();
            let second = unique(&args("Lead", false, None)).unwrap();
            assert_eq!(first, second);
        }

        #[test]
        fn test_empty_suffix_rejected() {
            let err = unique(&args("Lead", false, Some("--"))).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults_without_file() {
            let config = load_config(None).unwrap();
            assert_eq!(config.field, E2eConfig::default().field);
        }

        #[test]
        fn test_file_values_rendered() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "field:\n  probe_timeout_ms: 750").unwrap();
            let config = load_config(Some(file.path())).unwrap();
            assert!(render_config(&config).unwrap().contains("probe_timeout_ms: 750"));
        }
    }
}
