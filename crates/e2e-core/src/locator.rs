//! Locator abstraction for element selection.
//!
//! A [`Selector`] names an element the same way Playwright does (CSS, XPath,
//! text, test id) and renders to the DOM expression a driver evaluates.
//! A [`Locator`] pairs a selector with its wait behaviour, and a
//! [`FieldLocatorPair`] binds the two mutually exclusive renderings of one
//! logical form field.

use std::fmt;
use std::time::Duration;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Combined selector with text filter
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(path: impl Into<String>) -> Self {
        Self::XPath(path.into())
    }

    /// Expression evaluating to the first matching element (or null)
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::XPath(s) => {
                format!("document.evaluate({s:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue")
            }
            Self::Text(t) => {
                format!("Array.from(document.querySelectorAll('body *')).find(el => el.children.length === 0 && el.textContent.includes({t:?}))")
            }
            Self::TestId(id) => format!("document.querySelector('[data-testid={id:?}]')"),
            Self::CssWithText { css, text } => {
                format!("Array.from(document.querySelectorAll({css:?})).find(el => el.textContent.includes({text:?}))")
            }
        }
    }

    /// Expression evaluating to an array of every matching element, in document order
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
            Self::XPath(s) => {
                format!("(() => {{ const r = document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); return Array.from({{ length: r.snapshotLength }}, (_, i) => r.snapshotItem(i)); }})()")
            }
            Self::Text(t) => {
                format!("Array.from(document.querySelectorAll('body *')).filter(el => el.children.length === 0 && el.textContent.includes({t:?}))")
            }
            Self::TestId(id) => {
                format!("Array.from(document.querySelectorAll('[data-testid={id:?}]'))")
            }
            Self::CssWithText { css, text } => {
                format!("Array.from(document.querySelectorAll({css:?})).filter(el => el.textContent.includes({text:?}))")
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::TestId(id) => write!(f, "[data-testid=\"{id}\"]"),
            Self::CssWithText { css, text } => write!(f, "{css} >> text={text}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Self::Css(css.to_string())
    }
}

impl From<String> for Selector {
    fn from(css: String) -> Self {
        Self::Css(css)
    }
}

/// Per-locator wait overrides.
///
/// Unset fields defer to whatever wait the caller would otherwise use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout override
    pub timeout: Option<Duration>,
    /// Polling interval override
    pub poll_interval: Option<Duration>,
}

/// A locator for finding and interacting with elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Filter by text content
    ///
    /// Only CSS selectors can carry a text filter; other kinds are returned unchanged.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let selector = match self.selector {
            Selector::Css(css) => Selector::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        };
        Self {
            selector,
            options: self.options,
        }
    }

    /// Set custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Set custom polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = Some(interval);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::from_selector(selector)
    }
}

/// Two candidate bindings for the same logical form field.
///
/// Exactly one of them is expected to be visible at a time; the
/// [`DynamicFieldResolver`](crate::DynamicFieldResolver) checks this rather
/// than assuming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocatorPair {
    /// Binding assuming a plain text box
    pub text_variant: Locator,
    /// Binding assuming a searchable combobox
    pub combo_variant: Locator,
}

impl FieldLocatorPair {
    /// Create a pair from the two variant locators
    #[must_use]
    pub fn new(text_variant: impl Into<Locator>, combo_variant: impl Into<Locator>) -> Self {
        Self {
            text_variant: text_variant.into(),
            combo_variant: combo_variant.into(),
        }
    }

    /// Pair two CSS selectors
    #[must_use]
    pub fn css(text_variant: &str, combo_variant: &str) -> Self {
        Self::new(Locator::new(text_variant), Locator::new(combo_variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_selector() {
            let selector = Selector::css("input[name='email']");
            let query = selector.to_query();
            assert!(query.contains("querySelector"));
            assert!(query.contains("input[name='email']"));
        }

        #[test]
        fn test_test_id_selector() {
            let selector = Selector::test_id("otp-input");
            assert!(selector.to_query().contains("data-testid"));
            assert_eq!(selector.to_string(), "[data-testid=\"otp-input\"]");
        }

        #[test]
        fn test_all_query_is_array() {
            let selector = Selector::css("[role='option']");
            assert!(selector.to_all_query().starts_with("Array.from("));
        }

        #[test]
        fn test_xpath_all_query_snapshot() {
            let selector = Selector::xpath("//li");
            assert!(selector.to_all_query().contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert_eq!(selector.to_string(), "xpath=//li");
        }

        #[test]
        fn test_text_selector_display() {
            assert_eq!(Selector::text("Verify").to_string(), "text=Verify");
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_locator_new() {
            let locator = Locator::new("button");
            assert!(matches!(locator.selector(), Selector::Css(s) if s == "button"));
            assert_eq!(locator.options(), &LocatorOptions::default());
        }

        #[test]
        fn test_locator_with_text() {
            let locator = Locator::new("button").with_text("Verify");
            assert_eq!(locator.selector().to_string(), "button >> text=Verify");
        }

        #[test]
        fn test_with_text_ignored_for_non_css() {
            let locator = Locator::from_selector(Selector::test_id("x")).with_text("ignored");
            assert_eq!(locator.selector(), &Selector::test_id("x"));
        }

        #[test]
        fn test_locator_timeout() {
            let locator = Locator::new("input").with_timeout(Duration::from_millis(250));
            assert_eq!(locator.options().timeout, Some(Duration::from_millis(250)));
            assert_eq!(locator.options().poll_interval, None);
        }
    }

    mod field_pair_tests {
        use super::*;

        #[test]
        fn test_css_pair() {
            let pair = FieldLocatorPair::css("#industry", "#industry-combo");
            assert_eq!(pair.text_variant.selector().to_string(), "#industry");
            assert_eq!(pair.combo_variant.selector().to_string(), "#industry-combo");
        }
    }
}
