//! Run-scoped unique test values.
//!
//! Records created against a shared multi-tenant environment must not collide
//! with records from earlier or concurrent runs, yet a value generated when a
//! record is created has to be regenerated identically when the same run
//! searches for it. Both hold by appending one suffix that is fixed for the
//! whole run.

use std::fmt;
use std::sync::OnceLock;

/// Environment variable pinning the suffix (shared by all workers of one run)
pub const RUN_SUFFIX_ENV: &str = "CRM_E2E_RUN_SUFFIX";

static RUN_SUFFIX: OnceLock<RunSuffix> = OnceLock::new();

/// Suffix fixed for one test-execution run.
///
/// Lowercase ASCII alphanumerics only, so it is valid inside names, codes,
/// and email local parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunSuffix(String);

impl RunSuffix {
    /// Draw a new suffix: UTC timestamp to the second plus six random hex digits
    #[must_use]
    pub fn generate() -> Self {
        let stamp = chrono::Utc::now().format("%y%m%d%H%M%S");
        let token = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{stamp}{}", &token[..6]))
    }

    /// Use an explicit suffix; characters outside `[a-z0-9]` are dropped
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(
            raw.chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        )
    }

    /// Suffix pinned through [`RUN_SUFFIX_ENV`], if set and non-empty
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(RUN_SUFFIX_ENV)
            .ok()
            .map(|raw| Self::new(&raw))
            .filter(|s| !s.0.is_empty())
    }

    /// The process-wide suffix, computed on first use
    pub fn current() -> &'static Self {
        RUN_SUFFIX.get_or_init(|| Self::from_env().unwrap_or_else(Self::generate))
    }

    /// Fix the process-wide suffix before first use.
    ///
    /// Returns the rejected suffix if it is empty or one was already in place.
    pub fn install(suffix: Self) -> Result<(), Self> {
        if suffix.as_str().is_empty() {
            return Err(suffix);
        }
        RUN_SUFFIX.set(suffix)
    }

    /// Suffix text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pure function of `base` and one [`RunSuffix`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueValueGenerator {
    suffix: RunSuffix,
}

impl UniqueValueGenerator {
    /// Generator bound to an explicit suffix
    #[must_use]
    pub const fn new(suffix: RunSuffix) -> Self {
        Self { suffix }
    }

    /// Generator bound to the process-wide suffix
    #[must_use]
    pub fn for_run() -> Self {
        Self::new(RunSuffix::current().clone())
    }

    /// Suffix in use
    #[must_use]
    pub const fn suffix(&self) -> &RunSuffix {
        &self.suffix
    }

    /// `base` with the run suffix appended
    #[must_use]
    pub fn unique_value(&self, base: &str) -> String {
        format!("{base}_{}", self.suffix)
    }

    /// Email with the run suffix inserted before the last `@`.
    ///
    /// The domain is preserved. A base without `@` is not an address and gets
    /// the plain [`unique_value`](Self::unique_value) treatment.
    #[must_use]
    pub fn unique_email(&self, base: &str) -> String {
        match base.rsplit_once('@') {
            Some((local, domain)) => format!("{local}_{}@{domain}", self.suffix),
            None => self.unique_value(base),
        }
    }
}

/// [`UniqueValueGenerator::unique_value`] with the process-wide suffix
#[must_use]
pub fn unique_value(base: &str) -> String {
    UniqueValueGenerator::for_run().unique_value(base)
}

/// [`UniqueValueGenerator::unique_email`] with the process-wide suffix
#[must_use]
pub fn unique_email(base: &str) -> String {
    UniqueValueGenerator::for_run().unique_email(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod suffix_tests {
        use super::*;

        #[test]
        fn test_generated_shape() {
            let suffix = RunSuffix::generate();
            assert_eq!(suffix.as_str().len(), 18);
            assert!(suffix
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }

        #[test]
        fn test_separate_runs_differ() {
            assert_ne!(RunSuffix::generate(), RunSuffix::generate());
        }

        #[test]
        fn test_new_sanitizes() {
            assert_eq!(RunSuffix::new("CI-Job#42").as_str(), "cijob42");
        }

        #[test]
        fn test_current_is_stable() {
            assert_eq!(RunSuffix::current(), RunSuffix::current());
            assert!(RunSuffix::install(RunSuffix::new("late")).is_err());
        }

        #[test]
        fn test_install_rejects_empty() {
            let rejected = RunSuffix::install(RunSuffix::new("--")).unwrap_err();
            assert!(rejected.as_str().is_empty());
            assert!(!RunSuffix::current().as_str().is_empty());
        }
    }

    mod generator_tests {
        use super::*;

        fn generator() -> UniqueValueGenerator {
            UniqueValueGenerator::new(RunSuffix::new("run1"))
        }

        #[test]
        fn test_unique_value() {
            assert_eq!(generator().unique_value("Acme Corp"), "Acme Corp_run1");
        }

        #[test]
        fn test_unique_email_preserves_domain() {
            assert_eq!(generator().unique_email("a@b.com"), "a_run1@b.com");
        }

        #[test]
        fn test_unique_email_splits_on_last_at() {
            assert_eq!(
                generator().unique_email("\"odd@local\"@b.com"),
                "\"odd@local\"_run1@b.com"
            );
        }

        #[test]
        fn test_unique_email_without_at() {
            assert_eq!(generator().unique_email("contact"), "contact_run1");
        }

        #[test]
        fn test_free_functions_use_run_suffix() {
            let run = UniqueValueGenerator::for_run();
            assert_eq!(unique_value("Lead"), run.unique_value("Lead"));
            assert_eq!(unique_email("qa@x.io"), run.unique_email("qa@x.io"));
        }

        #[test]
        fn test_different_runs_do_not_collide() {
            let a = UniqueValueGenerator::new(RunSuffix::generate());
            let b = UniqueValueGenerator::new(RunSuffix::generate());
            assert_ne!(a.unique_value("Lead"), b.unique_value("Lead"));
        }
    }

    proptest! {
        #[test]
        fn prop_unique_value_idempotent_within_run(base in ".{0,40}") {
            let run = UniqueValueGenerator::new(RunSuffix::new("fixed"));
            prop_assert_eq!(run.unique_value(&base), run.unique_value(&base));
            prop_assert!(run.unique_value(&base).starts_with(base.as_str()));
        }

        #[test]
        fn prop_unique_email_shape(local in "[a-z0-9.]{1,20}", domain in "[a-z]{1,10}\\.[a-z]{2,4}") {
            let run = UniqueValueGenerator::new(RunSuffix::new("fixed"));
            let email = run.unique_email(&format!("{local}@{domain}"));
            let expected_domain = format!("@{domain}");
            prop_assert!(email.ends_with(&expected_domain));
            prop_assert!(email.starts_with(local.as_str()));
            prop_assert_eq!(email.matches('@').count(), 1);
        }
    }
}
