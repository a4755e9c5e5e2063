//! One-time verification codes from a disposable webmail inbox.
//!
//! Mail delivery is asynchronous and outside test control, so the lookup is a
//! bounded loop: open the inbox on an auxiliary page, open the newest message,
//! scan its body for a six-digit code, and retry with a fixed delay until the
//! attempt budget is spent. The auxiliary page is closed on every exit path.
//!
//! Two provider assumptions are carried as-is: the message list is ordered
//! newest-first, and the first run of exactly six digits in the body is the code.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::driver::{ContextFactory, PageDriver};
use crate::locator::Selector;
use crate::result::{CodeRetrievalError, DriverResult};
use crate::retry::RetryPolicy;
use crate::wait::WaitOptions;

/// Number of digits in a verification code
pub const CODE_LENGTH: usize = 6;

static CODE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn code_pattern() -> &'static Regex {
    // ASCII classes: `\d` would also match other Unicode digits
    CODE_PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9])([0-9]{6})(?:[^0-9]|$)").unwrap()
    })
}

/// Six-digit one-time code, consumed by a single login attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Accept exactly six ASCII digits
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        (raw.len() == CODE_LENGTH && raw.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(raw.to_string()))
    }

    /// Code digits
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First run of exactly six digits in `body`.
///
/// Longer digit runs (phone numbers, order ids) are skipped entirely.
#[must_use]
pub fn extract_code(body: &str) -> Option<VerificationCode> {
    code_pattern()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| VerificationCode::parse(m.as_str()))
}

/// Whether a previously handed-out code may be returned again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Whatever code the newest message carries
    #[default]
    Latest,
    /// Keep polling while the newest message still carries the last code returned
    Fresh,
}

/// Source of verification codes for a login challenge
#[async_trait]
pub trait CodeSource: Send {
    /// Obtain the current code delivered to `recipient`
    async fn fetch_code(
        &mut self,
        recipient: &str,
        freshness: Freshness,
    ) -> Result<VerificationCode, CodeRetrievalError>;
}

/// Webmail provider layout and polling budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// Inbox URL; `{recipient}` expands to the full address, `{inbox}` to its local part
    pub inbox_url: String,
    /// Button re-triggering the message list fetch, if the provider has one
    pub refresh_button: Option<String>,
    /// Message list rows, newest first
    pub message_rows: String,
    /// Element holding the opened message body (an iframe is read through)
    pub message_body: String,
    /// How long to wait for the message list to render (ms)
    pub list_timeout_ms: u64,
    /// How long to wait for an opened message body (ms)
    pub body_timeout_ms: u64,
    /// Attempt budget and delay between attempts
    pub retry: RetryPolicy,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            inbox_url: "https://www.mailinator.com/v4/public/inboxes.jsp?to={inbox}".to_string(),
            refresh_button: None,
            message_rows: "table.table-striped tbody tr".to_string(),
            message_body: "#html_msg_body".to_string(),
            list_timeout_ms: 10_000,
            body_timeout_ms: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl InboxConfig {
    /// Expand the URL template for `recipient`
    #[must_use]
    pub fn url_for(&self, recipient: &str) -> String {
        let inbox = recipient.split('@').next().unwrap_or(recipient);
        self.inbox_url
            .replace("{recipient}", recipient)
            .replace("{inbox}", inbox)
    }
}

/// Reads verification codes from a webmail inbox on auxiliary pages
#[derive(Debug)]
pub struct CodeRetriever<C: ContextFactory> {
    contexts: C,
    config: InboxConfig,
    last_delivered: Option<VerificationCode>,
}

impl<C: ContextFactory> CodeRetriever<C> {
    /// Create a retriever opening pages from `contexts`
    pub const fn new(contexts: C, config: InboxConfig) -> Self {
        Self {
            contexts,
            config,
            last_delivered: None,
        }
    }

    /// Inbox configuration
    pub const fn config(&self) -> &InboxConfig {
        &self.config
    }

    /// Code most recently returned by this retriever
    pub const fn last_delivered(&self) -> Option<&VerificationCode> {
        self.last_delivered.as_ref()
    }

    /// Newest code for `recipient`, trying at most `max_attempts` times
    pub async fn fetch_latest_code(
        &mut self,
        recipient: &str,
        max_attempts: u32,
    ) -> Result<VerificationCode, CodeRetrievalError> {
        let policy = self.config.retry.with_max_attempts(max_attempts);
        self.fetch(recipient, Freshness::Latest, policy).await
    }

    /// Look up a code with explicit freshness and retry policy
    pub async fn fetch(
        &mut self,
        recipient: &str,
        freshness: Freshness,
        policy: RetryPolicy,
    ) -> Result<VerificationCode, CodeRetrievalError> {
        let mut page = self
            .contexts
            .open_page()
            .await
            .map_err(|e| CodeRetrievalError::inbox_unavailable(e.to_string()))?;

        let outcome = self.poll_inbox(&mut page, recipient, freshness, policy).await;

        if let Err(err) = page.close().await {
            warn!(error = %err, "failed to close inbox page");
        }

        let code = outcome?;
        self.last_delivered = Some(code.clone());
        Ok(code)
    }

    async fn poll_inbox(
        &self,
        page: &mut C::Page,
        recipient: &str,
        freshness: Freshness,
        policy: RetryPolicy,
    ) -> Result<VerificationCode, CodeRetrievalError> {
        let url = self.config.url_for(recipient);
        let refresh = self.config.refresh_button.as_deref().map(Selector::css);

        for attempt in 1..=policy.attempts() {
            page.navigate(&url)
                .await
                .map_err(|e| CodeRetrievalError::inbox_unavailable(e.to_string()))?;
            if let Some(refresh) = &refresh {
                if let Err(err) = page.click(refresh).await {
                    warn!(attempt, error = %err, "inbox refresh failed");
                }
            }

            match self.read_newest(page).await {
                Ok(Some(code))
                    if freshness == Freshness::Fresh
                        && self.last_delivered.as_ref() == Some(&code) =>
                {
                    debug!(recipient, attempt, "newest message still carries the consumed code");
                }
                Ok(Some(code)) => {
                    info!(recipient, attempt, "verification code received");
                    return Ok(code);
                }
                Ok(None) => debug!(recipient, attempt, "no verification code yet"),
                Err(err) => warn!(recipient, attempt, error = %err, "inbox read failed"),
            }

            if policy.has_next(attempt) {
                tokio::time::sleep(policy.delay()).await;
            }
        }

        Err(CodeRetrievalError::NotFound {
            recipient: recipient.to_string(),
            attempts: policy.attempts(),
        })
    }

    async fn read_newest(&self, page: &C::Page) -> DriverResult<Option<VerificationCode>> {
        let rows = Selector::css(self.config.message_rows.as_str());
        let list_wait = WaitOptions::new().with_timeout(self.config.list_timeout_ms);
        if !page.wait_for_visible(&rows, &list_wait).await? {
            return Ok(None);
        }
        // newest-first ordering is assumed, not verified
        page.click_nth(&rows, 0).await?;

        let body = Selector::css(self.config.message_body.as_str());
        let body_wait = WaitOptions::new().with_timeout(self.config.body_timeout_ms);
        if !page.wait_for_visible(&body, &body_wait).await? {
            return Ok(None);
        }
        Ok(page
            .text_content(&body)
            .await?
            .as_deref()
            .and_then(extract_code))
    }
}

#[async_trait]
impl<C: ContextFactory> CodeSource for CodeRetriever<C> {
    async fn fetch_code(
        &mut self,
        recipient: &str,
        freshness: Freshness,
    ) -> Result<VerificationCode, CodeRetrievalError> {
        let policy = self.config.retry;
        self.fetch(recipient, freshness, policy).await
    }
}
