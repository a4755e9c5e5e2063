//! Abstract browser automation traits.
//!
//! The core never talks to a browser directly. It drives a [`PageDriver`]
//! (one navigable page) and, for the webmail lookup, a [`ContextFactory`]
//! that opens auxiliary pages. Implementations:
//!
//! - `ChromiumPage` / `ChromiumBrowser` - CDP via chromiumoxide (`browser` feature)
//! - [`MockPage`] / [`MockContexts`] - scriptable doubles for unit tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::locator::Selector;
use crate::result::{DriverError, DriverResult};
use crate::wait::WaitOptions;

/// A single navigable page.
///
/// Element operations act on the first match of the selector unless stated
/// otherwise; `click_nth` and `all_text_contents` see matches in document order.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL and wait for the load event
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Click the first matching element
    async fn click(&self, selector: &Selector) -> DriverResult<()>;

    /// Click the `index`-th matching element (0-based, document order)
    async fn click_nth(&self, selector: &Selector, index: usize) -> DriverResult<()>;

    /// Replace the value of the first matching input
    async fn fill(&self, selector: &Selector, text: &str) -> DriverResult<()>;

    /// Whether the first matching element is currently rendered and visible
    async fn is_visible(&self, selector: &Selector) -> DriverResult<bool>;

    /// Text of the first matching element, `None` if nothing matches
    async fn text_content(&self, selector: &Selector) -> DriverResult<Option<String>>;

    /// Text of every matching element, in document order
    async fn all_text_contents(&self, selector: &Selector) -> DriverResult<Vec<String>>;

    /// Close the page
    async fn close(&mut self) -> DriverResult<()>;

    /// Poll [`is_visible`](Self::is_visible) until it holds or the timeout passes.
    ///
    /// Running out of time yields `Ok(false)`; only driver failures are errors.
    async fn wait_for_visible(
        &self,
        selector: &Selector,
        options: &WaitOptions,
    ) -> DriverResult<bool> {
        poll_visibility(self, selector, options, true).await
    }

    /// Poll until the first match is hidden or gone.
    ///
    /// `Ok(false)` means it was still visible when the timeout passed.
    async fn wait_for_hidden(
        &self,
        selector: &Selector,
        options: &WaitOptions,
    ) -> DriverResult<bool> {
        poll_visibility(self, selector, options, false).await
    }
}

async fn poll_visibility<P: PageDriver + ?Sized>(
    page: &P,
    selector: &Selector,
    options: &WaitOptions,
    wanted: bool,
) -> DriverResult<bool> {
    let deadline = tokio::time::Instant::now() + options.timeout();
    loop {
        if page.is_visible(selector).await? == wanted {
            return Ok(true);
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Opens auxiliary pages isolated from the caller's primary page
#[async_trait]
pub trait ContextFactory: Send + Sync {
    /// Page type produced by this factory
    type Page: PageDriver;

    /// Open a new blank page
    async fn open_page(&self) -> DriverResult<Self::Page>;
}

// ============================================================================
// Mock implementation
// ============================================================================

#[derive(Debug, Default)]
struct MockState {
    current_url: String,
    visibility: HashMap<String, VecDeque<bool>>,
    texts: HashMap<String, VecDeque<Option<String>>>,
    lists: HashMap<String, Vec<String>>,
    failing_urls: Vec<String>,
    failing_selectors: Vec<String>,
    call_history: Vec<String>,
    close_count: usize,
    polling_waits: bool,
}

/// Pops the next scripted value; the final entry repeats forever.
fn next_scripted<T: Clone>(queue: Option<&mut VecDeque<T>>) -> Option<T> {
    let queue = queue?;
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// Scriptable page double.
///
/// Clones share state, so a test can keep one handle while the code under
/// test owns (and closes) another. Unscripted selectors are invisible and
/// have no text. Each `is_visible` call consumes one scripted entry.
/// `wait_for_visible` checks once unless [`MockPage::polling_waits`] is set;
/// `wait_for_hidden` always polls on the tokio clock.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    state: Arc<Mutex<MockState>>,
}

impl MockPage {
    /// Create new mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.state().call_history.push(call);
    }

    fn check_interactive(&self, selector: &Selector) -> DriverResult<()> {
        let key = selector.to_string();
        if self.state().failing_selectors.contains(&key) {
            return Err(DriverError::ElementNotFound { selector: key });
        }
        Ok(())
    }

    /// Script successive visibility probe results for a selector
    #[must_use]
    pub fn with_visible(
        self,
        selector: impl Into<Selector>,
        script: impl IntoIterator<Item = bool>,
    ) -> Self {
        let key = selector.into().to_string();
        self.state()
            .visibility
            .insert(key, script.into_iter().collect());
        self
    }

    /// Script successive `text_content` results for a selector
    #[must_use]
    pub fn with_texts<S: Into<String>>(
        self,
        selector: impl Into<Selector>,
        script: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        let key = selector.into().to_string();
        let queue = script.into_iter().map(|t| t.map(Into::into)).collect();
        self.state().texts.insert(key, queue);
        self
    }

    /// Set the elements returned by `all_text_contents` for a selector
    #[must_use]
    pub fn with_list<S: Into<String>>(
        self,
        selector: impl Into<Selector>,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        let key = selector.into().to_string();
        let items = items.into_iter().map(Into::into).collect();
        self.state().lists.insert(key, items);
        self
    }

    /// Make navigation to any URL starting with `prefix` fail
    #[must_use]
    pub fn fail_navigation(self, prefix: impl Into<String>) -> Self {
        self.state().failing_urls.push(prefix.into());
        self
    }

    /// Make click and fill on a selector fail
    #[must_use]
    pub fn fail_interaction(self, selector: impl Into<Selector>) -> Self {
        let key = selector.into().to_string();
        self.state().failing_selectors.push(key);
        self
    }

    /// Make `wait_for_visible` poll until its timeout like a real driver
    #[must_use]
    pub fn polling_waits(self) -> Self {
        self.state().polling_waits = true;
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().call_history.clone()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state()
            .call_history
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Count calls starting with `prefix`
    #[must_use]
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state()
            .call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// URL of the last successful navigation
    #[must_use]
    pub fn current_url(&self) -> String {
        self.state().current_url.clone()
    }

    /// Number of times the page was closed
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.state().close_count
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.record(format!("navigate:{url}"));
        let mut state = self.state();
        if state.failing_urls.iter().any(|p| url.starts_with(p)) {
            return Err(DriverError::NavigationError {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        state.current_url = url.to_string();
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> DriverResult<()> {
        self.record(format!("click:{selector}"));
        self.check_interactive(selector)
    }

    async fn click_nth(&self, selector: &Selector, index: usize) -> DriverResult<()> {
        self.record(format!("click_nth:{selector}:{index}"));
        self.check_interactive(selector)
    }

    async fn fill(&self, selector: &Selector, text: &str) -> DriverResult<()> {
        self.record(format!("fill:{selector}:{text}"));
        self.check_interactive(selector)
    }

    async fn is_visible(&self, selector: &Selector) -> DriverResult<bool> {
        self.record(format!("probe:{selector}"));
        let key = selector.to_string();
        let mut state = self.state();
        Ok(next_scripted(state.visibility.get_mut(&key)).unwrap_or(false))
    }

    async fn text_content(&self, selector: &Selector) -> DriverResult<Option<String>> {
        self.record(format!("text:{selector}"));
        let key = selector.to_string();
        let mut state = self.state();
        Ok(next_scripted(state.texts.get_mut(&key)).flatten())
    }

    async fn all_text_contents(&self, selector: &Selector) -> DriverResult<Vec<String>> {
        self.record(format!("list:{selector}"));
        let key = selector.to_string();
        Ok(self.state().lists.get(&key).cloned().unwrap_or_default())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.record("close".to_string());
        self.state().close_count += 1;
        Ok(())
    }

    async fn wait_for_visible(
        &self,
        selector: &Selector,
        options: &WaitOptions,
    ) -> DriverResult<bool> {
        let polling = self.state().polling_waits;
        if polling {
            return poll_visibility(self, selector, options, true).await;
        }
        self.is_visible(selector).await
    }
}

#[derive(Debug, Default)]
struct ContextsState {
    opened: usize,
    fail_open: bool,
}

/// Context factory handing out clones of one [`MockPage`]
#[derive(Debug, Clone, Default)]
pub struct MockContexts {
    page: MockPage,
    state: Arc<Mutex<ContextsState>>,
}

impl MockContexts {
    /// Create a factory whose pages share `page`'s script and history
    #[must_use]
    pub fn new(page: MockPage) -> Self {
        Self {
            page,
            state: Arc::default(),
        }
    }

    /// Make every `open_page` call fail
    #[must_use]
    pub fn failing(self) -> Self {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_open = true;
        self
    }

    /// Shared page handle for assertions
    #[must_use]
    pub const fn page(&self) -> &MockPage {
        &self.page
    }

    /// Number of pages opened so far
    #[must_use]
    pub fn opened(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .opened
    }
}

#[async_trait]
impl ContextFactory for MockContexts {
    type Page = MockPage;

    async fn open_page(&self) -> DriverResult<MockPage> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.fail_open {
            return Err(DriverError::PageError {
                message: "browser context refused".to_string(),
            });
        }
        state.opened += 1;
        Ok(self.page.clone())
    }
}
