//! Authenticated-session bootstrap.
//!
//! Drives the login form and, when the identity provider challenges the
//! login with an emailed one-time code, completes the challenge using a
//! [`CodeSource`]. A rejected code is retried once with a fresh lookup; a
//! second rejection is final.
//!
//! ```text
//! Idle -> CredentialsSubmitted -> Authenticated
//!                              -> ChallengePresented -> Authenticated
//!                                                    -> ChallengeRejectedOnce -> Authenticated
//!                                                                             -> ChallengeRejectedTwice
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::driver::PageDriver;
use crate::inbox::{CodeSource, Freshness, VerificationCode};
use crate::locator::Selector;
use crate::result::AuthError;
use crate::wait::WaitOptions;

/// Codes submitted per login before giving up
pub const MAX_CODE_SUBMISSIONS: u8 = 2;

/// Login credentials, fixed for one attempt
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username (usually the account email)
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login surface layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Login page URL
    pub login_url: String,
    /// Username input
    pub username_field: String,
    /// Password input
    pub password_field: String,
    /// Credentials submit button
    pub submit_button: String,
    /// Verification code input shown on a challenge
    pub code_input: String,
    /// Verification code submit button
    pub code_submit: String,
    /// Indicator shown when a submitted code is rejected
    pub code_rejected: String,
    /// Address the code is mailed to; defaults to the username
    pub recipient_address: Option<String>,
    /// How long to look for a challenge after submitting credentials (ms)
    pub challenge_timeout_ms: u64,
    /// How long to look for the rejection indicator after submitting a code (ms)
    pub verdict_timeout_ms: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            login_url: "http://localhost:8080/login".to_string(),
            username_field: "input[name='username']".to_string(),
            password_field: "input[type='password']".to_string(),
            submit_button: "button[type='submit']".to_string(),
            code_input: "input[name='verificationCode']".to_string(),
            code_submit: "button[type='submit']".to_string(),
            code_rejected: ".verification-error".to_string(),
            recipient_address: None,
            challenge_timeout_ms: 5_000,
            verdict_timeout_ms: 3_000,
        }
    }
}

/// Where a login attempt stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Nothing submitted yet
    Idle,
    /// Credentials submitted, no verdict yet
    CredentialsSubmitted,
    /// Verification code input displayed
    ChallengePresented,
    /// First code rejected, one retry left
    ChallengeRejectedOnce,
    /// Second code rejected (final)
    ChallengeRejectedTwice,
    /// Logged in
    Authenticated,
}

/// How a successful login completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No challenge appeared
    Direct,
    /// Challenge completed
    Verified {
        /// Codes submitted, including rejected ones
        codes_submitted: u8,
    },
}

/// Logs into the application, completing emailed-code challenges
#[derive(Debug)]
pub struct SessionAuthenticator<S: CodeSource> {
    config: LoginConfig,
    codes: S,
    state: LoginState,
}

impl<S: CodeSource> SessionAuthenticator<S> {
    /// Create an authenticator drawing codes from `codes`
    pub const fn new(config: LoginConfig, codes: S) -> Self {
        Self {
            config,
            codes,
            state: LoginState::Idle,
        }
    }

    /// Current state
    pub const fn state(&self) -> LoginState {
        self.state
    }

    /// Login configuration
    pub const fn config(&self) -> &LoginConfig {
        &self.config
    }

    /// Code source
    pub const fn code_source(&self) -> &S {
        &self.codes
    }

    /// Release the code source
    pub fn into_code_source(self) -> S {
        self.codes
    }

    fn transition(&mut self, next: LoginState) {
        debug!(from = ?self.state, to = ?next, "login state");
        self.state = next;
    }

    /// Log in on `page`.
    ///
    /// Failures before the challenge step are [`AuthError::LoginFailed`];
    /// two rejected codes are [`AuthError::VerificationRejected`].
    pub async fn login<P: PageDriver + ?Sized>(
        &mut self,
        page: &mut P,
        credentials: &Credentials,
    ) -> Result<AuthOutcome, AuthError> {
        self.transition(LoginState::Idle);
        self.submit_credentials(page, credentials).await?;
        self.transition(LoginState::CredentialsSubmitted);

        let code_input = Selector::css(self.config.code_input.as_str());
        let challenge_wait = WaitOptions::new().with_timeout(self.config.challenge_timeout_ms);
        let challenged = page
            .wait_for_visible(&code_input, &challenge_wait)
            .await
            .map_err(|e| AuthError::login_failed(e.to_string()))?;
        if !challenged {
            self.transition(LoginState::Authenticated);
            info!(user = %credentials.username, "logged in without verification challenge");
            return Ok(AuthOutcome::Direct);
        }
        self.transition(LoginState::ChallengePresented);

        let recipient = self
            .config
            .recipient_address
            .clone()
            .unwrap_or_else(|| credentials.username.clone());
        let rejected = Selector::css(self.config.code_rejected.as_str());
        let verdict_wait = WaitOptions::new().with_timeout(self.config.verdict_timeout_ms);

        for attempt in 1..=MAX_CODE_SUBMISSIONS {
            let freshness = if attempt == 1 {
                Freshness::Latest
            } else {
                Freshness::Fresh
            };
            let code = self.codes.fetch_code(&recipient, freshness).await?;
            self.submit_code(page, &code).await?;

            let was_rejected = self
                .code_rejected(page, &rejected, &verdict_wait, attempt > 1)
                .await?;
            if !was_rejected {
                self.transition(LoginState::Authenticated);
                info!(user = %credentials.username, codes_submitted = attempt, "logged in after verification");
                return Ok(AuthOutcome::Verified {
                    codes_submitted: attempt,
                });
            }

            warn!(user = %credentials.username, attempt, "verification code rejected");
            self.transition(if attempt == 1 {
                LoginState::ChallengeRejectedOnce
            } else {
                LoginState::ChallengeRejectedTwice
            });
        }

        Err(AuthError::VerificationRejected {
            attempts: MAX_CODE_SUBMISSIONS,
        })
    }

    /// Verdict on the code just submitted.
    ///
    /// With `stale` set the indicator from the previous rejection is still
    /// rendered; it has to clear before a new verdict can be read, and a
    /// banner that never clears counts as a rejection.
    async fn code_rejected<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        rejected: &Selector,
        wait: &WaitOptions,
        stale: bool,
    ) -> Result<bool, AuthError> {
        let failed = |e: crate::result::DriverError| AuthError::login_failed(e.to_string());
        if stale && !page.wait_for_hidden(rejected, wait).await.map_err(failed)? {
            debug!(indicator = %rejected, "rejection indicator never cleared");
            return Ok(true);
        }
        page.wait_for_visible(rejected, wait).await.map_err(failed)
    }

    async fn submit_credentials<P: PageDriver + ?Sized>(
        &self,
        page: &mut P,
        credentials: &Credentials,
    ) -> Result<(), AuthError> {
        let failed = |e: crate::result::DriverError| AuthError::login_failed(e.to_string());
        page.navigate(&self.config.login_url).await.map_err(failed)?;
        page.fill(
            &Selector::css(self.config.username_field.as_str()),
            &credentials.username,
        )
        .await
        .map_err(failed)?;
        page.fill(
            &Selector::css(self.config.password_field.as_str()),
            &credentials.password,
        )
        .await
        .map_err(failed)?;
        page.click(&Selector::css(self.config.submit_button.as_str()))
            .await
            .map_err(failed)
    }

    async fn submit_code<P: PageDriver + ?Sized>(
        &self,
        page: &mut P,
        code: &VerificationCode,
    ) -> Result<(), AuthError> {
        let failed = |e: crate::result::DriverError| {
            AuthError::login_failed(format!("submitting verification code: {e}"))
        };
        page.fill(&Selector::css(self.config.code_input.as_str()), code.as_str())
            .await
            .map_err(failed)?;
        page.click(&Selector::css(self.config.code_submit.as_str()))
            .await
            .map_err(failed)
    }
}
