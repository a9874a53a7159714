//! Mock implementations of the auth traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{OAuthClientError, OAuthClientTrait, OAuthError, Redirector, TokenSet};

#[derive(Debug)]
struct MockOAuthState {
    exchange_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    exchange_response: Mutex<Option<TokenSet>>,
    refresh_response: Mutex<Option<TokenSet>>,
    refresh_delay: Mutex<Option<Duration>>,
    last_exchange: Mutex<Option<(String, String)>>,
    last_refresh_token: Mutex<Option<String>>,
}

/// Mock OAuth client for token manager tests
///
/// Succeeds by default: the exchange returns `mock_access_token` with
/// `mock_refresh_token`, a refresh returns `refreshed_access_token` without
/// rotating the refresh token. Both last one hour. Clones share state.
#[derive(Debug, Clone)]
pub struct MockOAuthClient {
    state: Arc<MockOAuthState>,
}

impl MockOAuthClient {
    /// Create a new mock OAuth client with default state.
    #[must_use]
    pub fn new() -> Self {
        let state = MockOAuthState {
            exchange_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            exchange_response: Mutex::new(Some(TokenSet::new(
                "mock_access_token".to_string(),
                Some("mock_refresh_token".to_string()),
                3600,
                Some("user-read-private user-read-email".to_string()),
            ))),
            refresh_response: Mutex::new(Some(TokenSet::new(
                "refreshed_access_token".to_string(),
                None,
                3600,
                Some("user-read-private user-read-email".to_string()),
            ))),
            refresh_delay: Mutex::new(None),
            last_exchange: Mutex::new(None),
            last_refresh_token: Mutex::new(None),
        };

        Self { state: Arc::new(state) }
    }

    /// Configure the response returned by `exchange_code`.
    pub fn set_exchange_response(&self, tokens: TokenSet) {
        *self.state.exchange_response.lock() = Some(tokens);
    }

    /// Configure the response returned by `refresh_access_token`.
    pub fn set_refresh_response(&self, tokens: TokenSet) {
        *self.state.refresh_response.lock() = Some(tokens);
    }

    /// Make every exchange fail with `invalid_grant`.
    pub fn fail_exchange(&self) {
        *self.state.exchange_response.lock() = None;
    }

    /// Make every refresh fail with `invalid_grant`.
    pub fn fail_refresh(&self) {
        *self.state.refresh_response.lock() = None;
    }

    /// Sleep this long inside every refresh call.
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.state.refresh_delay.lock() = Some(delay);
    }

    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.state.exchange_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    /// `(code, code_verifier)` of the most recent exchange.
    #[must_use]
    pub fn last_exchange(&self) -> Option<(String, String)> {
        self.state.last_exchange.lock().clone()
    }

    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.state.last_refresh_token.lock().clone()
    }

    fn invalid_grant() -> OAuthClientError {
        OAuthClientError::Rejected {
            status: 400,
            error: Some(OAuthError {
                error: "invalid_grant".to_string(),
                error_description: Some("mock rejection".to_string()),
            }),
        }
    }
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    fn authorization_url(&self, code_challenge: &str) -> String {
        format!(
            "https://auth.test/authorize?response_type=code&code_challenge_method=S256\
             &code_challenge={code_challenge}"
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.state.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_exchange.lock() = Some((code.to_string(), code_verifier.to_string()));

        let response = self.state.exchange_response.lock().clone();
        response.ok_or_else(Self::invalid_grant)
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.state.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_refresh_token.lock() = Some(refresh_token.to_string());

        let delay = *self.state.refresh_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.state.refresh_response.lock().clone();
        response.ok_or_else(Self::invalid_grant)
    }

    fn redirect_uri(&self) -> &str {
        "https://localhost:5173/callback"
    }
}

/// Redirector that remembers every URL it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingRedirector {
    urls: Mutex<Vec<String>>,
}

impl RecordingRedirector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    #[must_use]
    pub fn last_url(&self) -> Option<String> {
        self.urls.lock().last().cloned()
    }
}

impl Redirector for RecordingRedirector {
    fn redirect(&self, url: &str) {
        self.urls.lock().push(url.to_string());
    }
}
