//! Dynamic form fields whose control type is only known at runtime.
//!
//! Depending on record state the CRM renders one logical field either as a
//! plain text box or as a searchable combobox. The resolver probes both
//! bindings of a [`FieldLocatorPair`], requires exactly one to be visible,
//! and drives whichever control is present.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::PageDriver;
use crate::locator::{FieldLocatorPair, Selector};
use crate::result::FieldResolutionError;
use crate::wait::WaitOptions;

/// Default probe timeout for each variant (2 seconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Default selector for rendered combobox options
pub const DEFAULT_OPTION_SELECTOR: &str = "[role='option']";

/// Resolver settings as they appear in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Per-variant probe timeout (ms)
    pub probe_timeout_ms: u64,
    /// Selector matching rendered combobox options
    pub option_selector: String,
    /// Type the value into an opened combobox before choosing
    pub type_to_search: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            option_selector: DEFAULT_OPTION_SELECTOR.to_string(),
            type_to_search: false,
        }
    }
}

/// Control variant found on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedField {
    /// Plain text box, filled directly
    TextField,
    /// Searchable combobox, opened and an option selected
    ComboField,
}

/// How an option label was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMatch {
    /// Label equals the value (case-sensitive)
    Exact,
    /// Label contains the value; used only when no label is exact
    Contains,
}

/// Pick the option for `value`.
///
/// Policy: the first case-sensitive exact label wins; failing that, the first
/// label containing `value`. Labels are compared after trimming whitespace.
/// A blank `value` matches nothing.
#[must_use]
pub fn select_option(labels: &[String], value: &str) -> Option<(usize, OptionMatch)> {
    if value.trim().is_empty() {
        return None;
    }
    labels
        .iter()
        .position(|label| label.trim() == value)
        .map(|i| (i, OptionMatch::Exact))
        .or_else(|| {
            labels
                .iter()
                .position(|label| label.contains(value))
                .map(|i| (i, OptionMatch::Contains))
        })
}

/// Fills a [`FieldLocatorPair`] on one page
#[derive(Debug)]
pub struct DynamicFieldResolver<'p, P: PageDriver + ?Sized> {
    page: &'p P,
    probe: WaitOptions,
    options: Selector,
    type_to_search: bool,
}

impl<'p, P: PageDriver + ?Sized> DynamicFieldResolver<'p, P> {
    /// Resolver with the default probe timeout and option selector
    pub fn new(page: &'p P) -> Self {
        Self {
            page,
            probe: WaitOptions::new().with_timeout(DEFAULT_PROBE_TIMEOUT_MS),
            options: Selector::css(DEFAULT_OPTION_SELECTOR),
            type_to_search: false,
        }
    }

    /// Resolver configured from `config`
    pub fn with_config(page: &'p P, config: &FieldConfig) -> Self {
        Self::new(page)
            .with_probe_timeout(config.probe_timeout_ms)
            .with_option_selector(config.option_selector.as_str())
            .with_type_to_search(config.type_to_search)
    }

    /// Set the per-variant probe timeout
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout_ms: u64) -> Self {
        self.probe = self.probe.with_timeout(timeout_ms);
        self
    }

    /// Set the selector matching rendered combobox options
    #[must_use]
    pub fn with_option_selector(mut self, selector: impl Into<Selector>) -> Self {
        self.options = selector.into();
        self
    }

    /// Type the value into an opened combobox to filter its options first
    #[must_use]
    pub const fn with_type_to_search(mut self, enabled: bool) -> Self {
        self.type_to_search = enabled;
        self
    }

    /// Determine which variant of `pair` is present.
    ///
    /// Both probes run concurrently and both complete before branching.
    /// A timeout or poll interval set on a variant's [`Locator`](crate::Locator)
    /// takes precedence over the resolver's own wait.
    pub async fn resolve(
        &self,
        pair: &FieldLocatorPair,
    ) -> Result<ResolvedField, FieldResolutionError> {
        let text = pair.text_variant.selector();
        let combo = pair.combo_variant.selector();
        let text_wait = self.probe.with_locator(&pair.text_variant);
        let combo_wait = self.probe.with_locator(&pair.combo_variant);
        let (text_visible, combo_visible) = futures::join!(
            self.page.wait_for_visible(text, &text_wait),
            self.page.wait_for_visible(combo, &combo_wait),
        );
        match (text_visible?, combo_visible?) {
            (true, false) => Ok(ResolvedField::TextField),
            (false, true) => Ok(ResolvedField::ComboField),
            (false, false) => Err(FieldResolutionError::NotPresent {
                text: text.to_string(),
                combo: combo.to_string(),
            }),
            (true, true) => Err(FieldResolutionError::Ambiguous {
                text: text.to_string(),
                combo: combo.to_string(),
            }),
        }
    }

    /// Fill `value` into whichever variant of `pair` is present
    pub async fn fill(
        &self,
        pair: &FieldLocatorPair,
        value: &str,
    ) -> Result<ResolvedField, FieldResolutionError> {
        let resolved = self.resolve(pair).await?;
        debug!(field = %pair.text_variant.selector(), ?resolved, "resolved dynamic field");
        match resolved {
            ResolvedField::TextField => {
                self.page
                    .fill(pair.text_variant.selector(), value)
                    .await?;
            }
            ResolvedField::ComboField => {
                self.select(pair.combo_variant.selector(), value).await?;
            }
        }
        Ok(resolved)
    }

    async fn select(&self, combo: &Selector, value: &str) -> Result<(), FieldResolutionError> {
        self.page.click(combo).await?;
        if self.type_to_search {
            self.page.fill(combo, value).await?;
        }
        let labels = if self.page.wait_for_visible(&self.options, &self.probe).await? {
            self.page.all_text_contents(&self.options).await?
        } else {
            Vec::new()
        };
        let Some((index, matched)) = select_option(&labels, value) else {
            return Err(FieldResolutionError::NoMatchingOption {
                value: value.to_string(),
                available: labels,
            });
        };
        debug!(%combo, index, ?matched, "selecting combobox option");
        self.page.click_nth(&self.options, index).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockPage;
    use crate::locator::Locator;
    use std::time::Duration;

    fn pair() -> FieldLocatorPair {
        FieldLocatorPair::css("#industry", "#industry-combo")
    }

    mod select_option_tests {
        use super::*;

        fn labels(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        }

        #[test]
        fn test_exact_beats_earlier_contains() {
            let labels = labels(&["Retail Banking", "Retail"]);
            assert_eq!(select_option(&labels, "Retail"), Some((1, OptionMatch::Exact)));
        }

        #[test]
        fn test_contains_fallback() {
            let labels = labels(&["Healthcare", "Software Services"]);
            assert_eq!(
                select_option(&labels, "Software"),
                Some((1, OptionMatch::Contains))
            );
        }

        #[test]
        fn test_exact_is_case_sensitive() {
            let labels = labels(&["retail"]);
            assert_eq!(select_option(&labels, "Retail"), None);
        }

        #[test]
        fn test_blank_value_matches_nothing() {
            let labels = labels(&["Healthcare", "Retail"]);
            assert_eq!(select_option(&labels, ""), None);
            assert_eq!(select_option(&labels, "  "), None);
        }

        #[test]
        fn test_trimmed_exact() {
            let labels = labels(&["  Retail \n"]);
            assert_eq!(select_option(&labels, "Retail"), Some((0, OptionMatch::Exact)));
        }
    }

    mod resolver_tests {
        use super::*;

        #[tokio::test]
        async fn test_fills_text_variant() {
            let page = MockPage::new()
                .with_visible("#industry", [true])
                .with_visible("#industry-combo", [false]);
            let resolved = DynamicFieldResolver::new(&page)
                .fill(&pair(), "Retail")
                .await
                .unwrap();
            assert_eq!(resolved, ResolvedField::TextField);
            assert!(page.was_called("fill:#industry:Retail"));
            assert!(!page.was_called("click"));
        }

        #[tokio::test]
        async fn test_clicks_and_selects_combo_variant() {
            let page = MockPage::new()
                .with_visible("#industry", [false])
                .with_visible("#industry-combo", [true])
                .with_visible(DEFAULT_OPTION_SELECTOR, [true])
                .with_list(DEFAULT_OPTION_SELECTOR, ["Healthcare", "Retail"]);
            let resolved = DynamicFieldResolver::new(&page)
                .fill(&pair(), "Retail")
                .await
                .unwrap();
            assert_eq!(resolved, ResolvedField::ComboField);
            assert!(page.was_called("click:#industry-combo"));
            assert!(page.was_called(&format!("click_nth:{DEFAULT_OPTION_SELECTOR}:1")));
            assert!(!page.was_called("fill:"));
        }

        #[tokio::test]
        async fn test_type_to_search() {
            let page = MockPage::new()
                .with_visible("#industry-combo", [true])
                .with_visible("li.opt", [true])
                .with_list("li.opt", ["Retail"]);
            DynamicFieldResolver::new(&page)
                .with_option_selector("li.opt")
                .with_type_to_search(true)
                .fill(&pair(), "Retail")
                .await
                .unwrap();
            assert!(page.was_called("fill:#industry-combo:Retail"));
            assert!(page.was_called("click_nth:li.opt:0"));
        }

        #[tokio::test]
        async fn test_with_config() {
            let page = MockPage::new()
                .with_visible("#industry-combo", [true])
                .with_visible("ul li", [true])
                .with_list("ul li", ["Retail"]);
            let config: FieldConfig =
                serde_yaml_ng::from_str("option_selector: ul li\ntype_to_search: true\n").unwrap();
            assert_eq!(config.probe_timeout_ms, DEFAULT_PROBE_TIMEOUT_MS);
            DynamicFieldResolver::with_config(&page, &config)
                .fill(&pair(), "Retail")
                .await
                .unwrap();
            assert!(page.was_called("fill:#industry-combo:Retail"));
            assert!(page.was_called("click_nth:ul li:0"));
        }

        #[tokio::test]
        async fn test_both_visible_is_ambiguous() {
            let page = MockPage::new()
                .with_visible("#industry", [true])
                .with_visible("#industry-combo", [true]);
            let err = DynamicFieldResolver::new(&page)
                .fill(&pair(), "Retail")
                .await
                .unwrap_err();
            assert!(matches!(err, FieldResolutionError::Ambiguous { .. }));
            assert!(!page.was_called("fill:"));
            assert!(!page.was_called("click"));
        }

        #[tokio::test]
        async fn test_neither_visible_is_not_present() {
            let page = MockPage::new();
            let err = DynamicFieldResolver::new(&page)
                .fill(&pair(), "Retail")
                .await
                .unwrap_err();
            assert!(matches!(err, FieldResolutionError::NotPresent { .. }));
        }

        #[tokio::test]
        async fn test_both_probes_complete() {
            let page = MockPage::new().with_visible("#industry", [true]);
            let _ = DynamicFieldResolver::new(&page).resolve(&pair()).await;
            let history = page.history();
            assert!(history.contains(&"probe:#industry".to_string()));
            assert!(history.contains(&"probe:#industry-combo".to_string()));
        }

        #[tokio::test]
        async fn test_no_matching_option() {
            let page = MockPage::new()
                .with_visible("#industry-combo", [true])
                .with_visible(DEFAULT_OPTION_SELECTOR, [true])
                .with_list(DEFAULT_OPTION_SELECTOR, ["Healthcare"]);
            let err = DynamicFieldResolver::new(&page)
                .fill(&pair(), "Retail")
                .await
                .unwrap_err();
            match err {
                FieldResolutionError::NoMatchingOption { value, available } => {
                    assert_eq!(value, "Retail");
                    assert_eq!(available, vec!["Healthcare".to_string()]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_empty_value_selects_no_option() {
            let page = MockPage::new()
                .with_visible("#f-combo", [true])
                .with_visible(DEFAULT_OPTION_SELECTOR, [true])
                .with_list(DEFAULT_OPTION_SELECTOR, ["Healthcare", "Retail"]);
            let err = DynamicFieldResolver::new(&page)
                .fill(&FieldLocatorPair::css("#f", "#f-combo"), "")
                .await
                .unwrap_err();
            match err {
                FieldResolutionError::NoMatchingOption { value, available } => {
                    assert!(value.is_empty());
                    assert_eq!(available.len(), 2);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!page.was_called("click_nth:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_locator_timeout_overrides_resolver_default() {
            let page = MockPage::new().polling_waits();
            let pair = FieldLocatorPair::new(
                Locator::new("#f").with_timeout(Duration::from_millis(50)),
                Locator::new("#f-combo").with_timeout(Duration::from_millis(50)),
            );
            let start = tokio::time::Instant::now();
            let err = DynamicFieldResolver::new(&page).resolve(&pair).await.unwrap_err();
            assert!(matches!(err, FieldResolutionError::NotPresent { .. }));
            assert_eq!(start.elapsed(), Duration::from_millis(50));
        }

        #[tokio::test(start_paused = true)]
        async fn test_resolver_timeout_without_locator_override() {
            let page = MockPage::new().polling_waits();
            let start = tokio::time::Instant::now();
            let err = DynamicFieldResolver::new(&page)
                .with_probe_timeout(400)
                .resolve(&pair())
                .await
                .unwrap_err();
            assert!(matches!(err, FieldResolutionError::NotPresent { .. }));
            assert_eq!(start.elapsed(), Duration::from_millis(400));
        }

        #[tokio::test]
        async fn test_text_fill_failure_is_interaction() {
            let page = MockPage::new()
                .with_visible("#industry", [true])
                .fail_interaction("#industry");
            let err = DynamicFieldResolver::new(&page)
                .fill(&pair(), "Retail")
                .await
                .unwrap_err();
            assert!(matches!(err, FieldResolutionError::Interaction(_)));
        }
    }
}
