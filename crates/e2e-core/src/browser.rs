//! Browser control over the Chrome `DevTools` Protocol.
//!
//! [`DriverConfig`] is always available so configuration files parse without
//! a browser. The real backend lives behind the `browser` feature and uses
//! chromiumoxide; element operations are DOM expressions rendered from
//! [`Selector`](crate::Selector) and evaluated in the page.

use serde::{Deserialize, Serialize};

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Upper bound for one navigation, in milliseconds
    pub navigation_timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
            navigation_timeout_ms: 30_000,
        }
    }
}

impl DriverConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

#[cfg(feature = "browser")]
#[allow(
    clippy::wildcard_imports,
    clippy::significant_drop_tightening,
    clippy::missing_errors_doc
)]
mod cdp {
    use super::*;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tracing::debug;

    use crate::driver::{ContextFactory, PageDriver};
    use crate::locator::Selector;
    use crate::result::{DriverError, DriverResult};

    #[derive(Debug)]
    struct Shared {
        browser: Mutex<CdpBrowser>,
        handle: tokio::task::JoinHandle<()>,
    }

    /// Running Chromium instance.
    ///
    /// Clones share the same process; every page it opens is an independent
    /// tab, which is what the webmail lookup relies on.
    #[derive(Debug, Clone)]
    pub struct ChromiumBrowser {
        config: DriverConfig,
        shared: Arc<Shared>,
    }

    impl ChromiumBrowser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: DriverConfig) -> DriverResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .request_timeout(Duration::from_millis(config.navigation_timeout_ms));

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| DriverError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                DriverError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            debug!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                shared: Arc::new(Shared {
                    browser: Mutex::new(browser),
                    handle,
                }),
            })
        }

        /// Open a new blank page
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn new_page(&self) -> DriverResult<ChromiumPage> {
            let browser = self.shared.browser.lock().await;
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| DriverError::PageError {
                    message: e.to_string(),
                })?;
            Ok(ChromiumPage {
                inner: page,
                navigation_timeout: Duration::from_millis(self.config.navigation_timeout_ms),
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &DriverConfig {
            &self.config
        }

        /// Close the browser and stop the protocol handler
        pub async fn close(self) -> DriverResult<()> {
            let mut browser = self.shared.browser.lock().await;
            browser.close().await.map_err(|e| DriverError::PageError {
                message: e.to_string(),
            })?;
            self.shared.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl ContextFactory for ChromiumBrowser {
        type Page = ChromiumPage;

        async fn open_page(&self) -> DriverResult<ChromiumPage> {
            self.new_page().await
        }
    }

    /// One Chromium tab
    #[derive(Debug)]
    pub struct ChromiumPage {
        inner: CdpPage,
        navigation_timeout: Duration,
    }

    impl ChromiumPage {
        async fn eval<T: DeserializeOwned>(&self, script: String) -> DriverResult<T> {
            let result = self
                .inner
                .evaluate(script)
                .await
                .map_err(|e| DriverError::EvaluationError {
                    message: e.to_string(),
                })?;
            Ok(result.into_value()?)
        }

        /// Evaluate `body` with `el` bound; `false` from the script means no match
        async fn act_on(&self, element: String, body: &str, selector: &Selector) -> DriverResult<()> {
            let script =
                format!("(() => {{ const el = {element}; if (!el) return false; {body} return true; }})()");
            if self.eval::<bool>(script).await? {
                Ok(())
            } else {
                Err(DriverError::ElementNotFound {
                    selector: selector.to_string(),
                })
            }
        }
    }

    const CLICK: &str = "el.scrollIntoView({ block: 'center' }); el.click();";

    fn fill_body(text: &str) -> DriverResult<String> {
        let value = serde_json::to_string(text)?;
        Ok(format!(
            "el.focus(); \
             const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
             Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, {value}); \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));"
        ))
    }

    #[async_trait]
    impl PageDriver for ChromiumPage {
        async fn navigate(&mut self, url: &str) -> DriverResult<()> {
            let navigation_error = |message: String| DriverError::NavigationError {
                url: url.to_string(),
                message,
            };
            tokio::time::timeout(self.navigation_timeout, self.inner.goto(url))
                .await
                .map_err(|_| navigation_error(format!(
                    "timed out after {}ms",
                    self.navigation_timeout.as_millis()
                )))?
                .map_err(|e| navigation_error(e.to_string()))?;
            debug!(url, "navigated");
            Ok(())
        }

        async fn click(&self, selector: &Selector) -> DriverResult<()> {
            self.act_on(selector.to_query(), CLICK, selector).await
        }

        async fn click_nth(&self, selector: &Selector, index: usize) -> DriverResult<()> {
            let element = format!("{}[{index}]", selector.to_all_query());
            self.act_on(element, CLICK, selector).await
        }

        async fn fill(&self, selector: &Selector, text: &str) -> DriverResult<()> {
            self.act_on(selector.to_query(), &fill_body(text)?, selector)
                .await
        }

        async fn is_visible(&self, selector: &Selector) -> DriverResult<bool> {
            let script = format!(
                "(() => {{ const el = {}; if (!el) return false; \
                 const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
                 return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }})()",
                selector.to_query()
            );
            self.eval(script).await
        }

        async fn text_content(&self, selector: &Selector) -> DriverResult<Option<String>> {
            // Iframes (webmail message bodies) are read through their document.
            let script = format!(
                "(() => {{ const el = {}; if (!el) return []; \
                 if (el.tagName === 'IFRAME') {{ const doc = el.contentDocument; \
                 return doc && doc.body ? [doc.body.innerText] : []; }} \
                 return [el.innerText ?? el.textContent ?? '']; }})()",
                selector.to_query()
            );
            let found: Vec<String> = self.eval(script).await?;
            Ok(found.into_iter().next())
        }

        async fn all_text_contents(&self, selector: &Selector) -> DriverResult<Vec<String>> {
            let script = format!(
                "{}.map(el => (el.innerText ?? el.textContent ?? '').trim())",
                selector.to_all_query()
            );
            self.eval(script).await
        }

        async fn close(&mut self) -> DriverResult<()> {
            self.inner
                .clone()
                .close()
                .await
                .map_err(|e| DriverError::PageError {
                    message: e.to_string(),
                })
        }
    }

}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumBrowser, ChromiumPage};
