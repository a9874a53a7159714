//! Token manager for the Spotify PKCE session
//!
//! Manages the OAuth credential lifecycle:
//! - Starting authorization (verifier generation + redirect)
//! - Exchanging the redirect's code for tokens
//! - Serving unexpired access tokens, refreshing expired ones
//! - Clearing the session on logout or failed refresh
//!
//! All state lives in the injected [`KeyValueStore`], so a restarted process
//! picks up where the last one stopped.

use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::client::OAuthClientError;
use super::pkce::{PkceChallenge, PkceError};
use super::traits::{OAuthClientTrait, Redirector};
use super::types::{AuthState, StoredCredentials, TokenSet, TokenStatus};
use crate::clock::{Clock, SystemClock};
use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Verifier length used when none is configured
pub const DEFAULT_VERIFIER_LENGTH: usize = 64;

/// Error type for token manager operations
#[derive(Debug, Error)]
pub enum TokenManagerError {
    /// `complete_authorization` ran without a preceding `begin_authorization`
    #[error("Code verifier not found; start authorization first")]
    MissingVerifier,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(#[source] OAuthClientError),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] OAuthClientError),

    /// `logout` ran while the refresh request was in flight; its result was
    /// discarded
    #[error("Session was logged out during token refresh")]
    SessionCleared,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pkce(#[from] PkceError),
}

/// Store keys for the persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub code_verifier: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Decimal epoch milliseconds
    pub token_expiry: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            code_verifier: "code_verifier".to_string(),
            access_token: "spotify_access_token".to_string(),
            refresh_token: "spotify_refresh_token".to_string(),
            token_expiry: "spotify_token_expiry".to_string(),
        }
    }
}

impl StorageKeys {
    fn credential_keys(&self) -> [&str; 3] {
        [self.access_token.as_str(), self.refresh_token.as_str(), self.token_expiry.as_str()]
    }
}

/// The single outstanding code verifier.
///
/// A new authorization attempt overwrites it; a successful exchange clears
/// it.
#[derive(Debug, Clone)]
struct VerifierSlot {
    key: String,
}

impl VerifierSlot {
    fn replace<S: KeyValueStore + ?Sized>(&self, store: &S, verifier: &str) -> StorageResult<()> {
        store.set(&self.key, verifier)
    }

    fn load<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<Option<String>> {
        Ok(store.get(&self.key)?.filter(|v| !v.is_empty()))
    }

    fn clear<S: KeyValueStore + ?Sized>(&self, store: &S) -> StorageResult<()> {
        store.delete(&self.key)
    }
}

/// What to do with the stored refresh token when the server issues none.
#[derive(Debug, Clone, Copy)]
enum MissingRefreshToken {
    /// Code exchange: a leftover token belongs to an older session
    Delete,
    /// Refresh: the current token stays valid
    Keep,
}

/// OAuth credential lifecycle manager
///
/// 1. `begin_authorization` stores a fresh verifier and redirects
/// 2. `complete_authorization` exchanges the code and stores the tokens
/// 3. `get_valid_access_token` serves or refreshes the access token
/// 4. `logout` drops everything
///
/// Refreshes are single-flight: concurrent callers that find the token
/// expired queue on one guard, and whoever gets it after a successful
/// refresh reuses the stored result. A refresh that completes after
/// `logout` is dropped instead of stored.
pub struct TokenManager<C: OAuthClientTrait + 'static, S: KeyValueStore + 'static> {
    oauth_client: Arc<C>,
    store: Arc<S>,
    redirector: Arc<dyn Redirector>,
    clock: Arc<dyn Clock>,
    keys: StorageKeys,
    verifier: VerifierSlot,
    verifier_length: usize,
    refresh_guard: Mutex<()>,
    /// Bumped by every logout; credential writes happen under this lock
    logout_epoch: SyncMutex<u64>,
}

impl<C: OAuthClientTrait + 'static, S: KeyValueStore + 'static> TokenManager<C, S> {
    /// Create a token manager with the system clock, a 64 character
    /// verifier and the default storage keys.
    #[must_use]
    pub fn new(oauth_client: C, store: Arc<S>, redirector: Arc<dyn Redirector>) -> Self {
        let keys = StorageKeys::default();
        let verifier = VerifierSlot { key: keys.code_verifier.clone() };

        Self {
            oauth_client: Arc::new(oauth_client),
            store,
            redirector,
            clock: Arc::new(SystemClock),
            keys,
            verifier,
            verifier_length: DEFAULT_VERIFIER_LENGTH,
            refresh_guard: Mutex::new(()),
            logout_epoch: SyncMutex::new(0),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Length is checked when authorization starts.
    #[must_use]
    pub fn with_verifier_length(mut self, length: usize) -> Self {
        self.verifier_length = length;
        self
    }

    #[must_use]
    pub fn with_storage_keys(mut self, keys: StorageKeys) -> Self {
        self.verifier = VerifierSlot { key: keys.code_verifier.clone() };
        self.keys = keys;
        self
    }

    /// Start the authorization-code flow.
    ///
    /// Generates and stores a new verifier (replacing any earlier one), then
    /// sends the user agent to the authorize URL carrying its challenge.
    ///
    /// # Errors
    /// Returns `Pkce` for an out-of-range verifier length and `Storage` when
    /// the verifier cannot be saved. Nothing is redirected on error.
    pub fn begin_authorization(&self) -> Result<(), TokenManagerError> {
        let pkce = PkceChallenge::generate(self.verifier_length)?;
        self.verifier.replace(self.store.as_ref(), &pkce.code_verifier)?;

        let url = self.oauth_client.authorization_url(&pkce.code_challenge);
        info!(redirect_uri = self.oauth_client.redirect_uri(), "Starting Spotify authorization");
        self.redirector.redirect(&url);

        Ok(())
    }

    /// Exchange the redirect's authorization code for tokens.
    ///
    /// On success the tokens are stored, the verifier is deleted and the
    /// access token is returned. On failure the verifier stays so the
    /// exchange can be retried with a new code.
    ///
    /// # Errors
    /// - `MissingVerifier` if authorization was never started (no request is
    ///   made)
    /// - `TokenExchangeFailed` if the token endpoint rejects the code or
    ///   answers with something unusable
    /// - `Storage` if the tokens cannot be saved
    pub async fn complete_authorization(&self, code: &str) -> Result<String, TokenManagerError> {
        let verifier =
            self.verifier.load(self.store.as_ref())?.ok_or(TokenManagerError::MissingVerifier)?;

        let tokens = self.oauth_client.exchange_code(code, &verifier).await.map_err(|e| {
            warn!(error = %e, "Authorization code exchange failed");
            TokenManagerError::TokenExchangeFailed(e)
        })?;

        {
            let _guard = self.refresh_guard.lock().await;
            let _epoch = self.logout_epoch.lock();
            self.persist_tokens(&tokens, MissingRefreshToken::Delete)?;
        }

        if let Err(e) = self.verifier.clear(self.store.as_ref()) {
            warn!(error = %e, "Failed to delete used code verifier");
        }

        info!(
            expires_in = tokens.expires_in,
            has_refresh_token = tokens.refresh_token.is_some(),
            "Spotify authorization completed"
        );

        Ok(tokens.access_token)
    }

    /// Get an access token that has not expired, refreshing if needed.
    ///
    /// Never fails: storage and refresh problems are logged and reported
    /// as an unauthenticated status. A failed refresh clears the stored
    /// session and yields `SessionExpired`.
    pub async fn get_valid_access_token(&self) -> TokenStatus {
        match self.load_credentials() {
            Ok(None) => return TokenStatus::NotAuthenticated,
            Ok(Some(creds)) if !creds.is_expired(self.now_ms()) => {
                return TokenStatus::Valid(creds.access_token)
            }
            Ok(Some(_)) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                return TokenStatus::NotAuthenticated;
            }
        }

        let _guard = self.refresh_guard.lock().await;

        // Another caller may have refreshed (or purged) while we waited.
        match self.load_credentials() {
            Ok(None) => return TokenStatus::NotAuthenticated,
            Ok(Some(creds)) if !creds.is_expired(self.now_ms()) => {
                debug!("Reusing token refreshed by a concurrent caller");
                return TokenStatus::Valid(creds.access_token);
            }
            Ok(Some(_)) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                return TokenStatus::NotAuthenticated;
            }
        }

        match self.refresh_locked().await {
            Ok(access_token) => TokenStatus::Valid(access_token),
            Err(TokenManagerError::SessionCleared) => TokenStatus::NotAuthenticated,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                if let Err(e) = self.clear_credentials() {
                    warn!(error = %e, "Failed to clear credentials after refresh failure");
                }
                TokenStatus::SessionExpired
            }
        }
    }

    /// Refresh the access token with the stored refresh token.
    ///
    /// Overwrites the access token and expiry together. The refresh token is
    /// replaced only when the server rotates it. Stored credentials are left
    /// alone on failure.
    ///
    /// # Errors
    /// - `NoRefreshToken` if none is stored
    /// - `RefreshFailed` if the token endpoint rejects the request or answers
    ///   with something unusable
    /// - `SessionCleared` if `logout` ran while the request was in flight
    /// - `Storage` if reading or writing the store fails
    pub async fn refresh(&self) -> Result<String, TokenManagerError> {
        let _guard = self.refresh_guard.lock().await;
        self.refresh_locked().await
    }

    /// Delete the access token, refresh token and expiry. Idempotent.
    ///
    /// A refresh still waiting on the token endpoint is invalidated and will
    /// not write its result.
    ///
    /// # Errors
    /// Returns `Storage` if a key cannot be deleted; the remaining keys are
    /// still attempted.
    pub fn logout(&self) -> Result<(), TokenManagerError> {
        {
            let mut epoch = self.logout_epoch.lock();
            *epoch += 1;
            self.clear_credentials()?;
        }
        info!("Logged out of Spotify");
        Ok(())
    }

    /// Current lifecycle position, derived from storage.
    ///
    /// # Errors
    /// Returns `Storage` if the store cannot be read.
    pub fn state(&self) -> Result<AuthState, TokenManagerError> {
        if self.refresh_guard.try_lock().is_err() {
            return Ok(AuthState::Refreshing);
        }

        if let Some(creds) = self.load_credentials()? {
            return Ok(if creds.is_expired(self.now_ms()) {
                AuthState::Expired
            } else {
                AuthState::Authenticated
            });
        }

        if self.verifier.load(self.store.as_ref())?.is_some() {
            return Ok(AuthState::PendingExchange);
        }

        Ok(AuthState::Unauthenticated)
    }

    /// Stored access token, refresh token and expiry, if an access token and
    /// an expiry are both present.
    ///
    /// # Errors
    /// Returns `Storage` if the store cannot be read.
    pub fn stored_credentials(&self) -> Result<Option<StoredCredentials>, TokenManagerError> {
        Ok(self.load_credentials()?)
    }

    /// Get the OAuth client
    #[must_use]
    pub fn oauth_client(&self) -> &C {
        &self.oauth_client
    }

    /// Caller must hold `refresh_guard`.
    async fn refresh_locked(&self) -> Result<String, TokenManagerError> {
        let refresh_token = self
            .store
            .get(&self.keys.refresh_token)?
            .filter(|token| !token.is_empty())
            .ok_or(TokenManagerError::NoRefreshToken)?;

        let epoch = *self.logout_epoch.lock();

        debug!("Refreshing Spotify access token");
        let tokens = self
            .oauth_client
            .refresh_access_token(&refresh_token)
            .await
            .map_err(TokenManagerError::RefreshFailed)?;

        {
            let current = self.logout_epoch.lock();
            if *current != epoch {
                info!("Logged out during token refresh, discarding new tokens");
                return Err(TokenManagerError::SessionCleared);
            }
            self.persist_tokens(&tokens, MissingRefreshToken::Keep)?;
        }

        info!(
            expires_in = tokens.expires_in,
            rotated_refresh_token = tokens.refresh_token.is_some(),
            "Access token refreshed"
        );

        Ok(tokens.access_token)
    }

    fn persist_tokens(
        &self,
        tokens: &TokenSet,
        missing_refresh: MissingRefreshToken,
    ) -> StorageResult<()> {
        let expires_at = tokens.expires_at_ms(self.now_ms()).to_string();

        // Drop a leftover refresh token first so a failed delete stores nothing
        if tokens.refresh_token.is_none() {
            if let MissingRefreshToken::Delete = missing_refresh {
                self.store.delete(&self.keys.refresh_token)?;
            }
        }

        let mut entries = vec![
            (self.keys.access_token.as_str(), tokens.access_token.as_str()),
            (self.keys.token_expiry.as_str(), expires_at.as_str()),
        ];
        if let Some(refresh_token) = &tokens.refresh_token {
            entries.push((self.keys.refresh_token.as_str(), refresh_token.as_str()));
        }

        self.store.set_many(&entries)?;

        debug!(expires_at_ms = %expires_at, "Stored access token");
        Ok(())
    }

    fn load_credentials(&self) -> StorageResult<Option<StoredCredentials>> {
        let Some(access_token) = self.store.get(&self.keys.access_token)?.filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };
        let Some(raw_expiry) = self.store.get(&self.keys.token_expiry)? else {
            return Ok(None);
        };

        let expires_at_ms = raw_expiry.trim().parse::<u64>().ok();
        if expires_at_ms.is_none() {
            debug!("Stored token expiry is unreadable, treating token as expired");
        }

        Ok(Some(StoredCredentials {
            access_token,
            refresh_token: self.store.get(&self.keys.refresh_token)?,
            expires_at_ms,
        }))
    }

    fn clear_credentials(&self) -> StorageResult<()> {
        self.store.delete_many(&self.keys.credential_keys())
    }

    fn now_ms(&self) -> u64 {
        self.clock.millis_since_epoch()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::token_manager.
    use std::time::Duration;

    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::{MockClock, MockOAuthClient, RecordingRedirector};

    struct Harness {
        manager: TokenManager<MockOAuthClient, MemoryStore>,
        client: MockOAuthClient,
        store: Arc<MemoryStore>,
        clock: MockClock,
        redirector: Arc<RecordingRedirector>,
    }

    fn harness() -> Harness {
        let client = MockOAuthClient::new();
        let store = Arc::new(MemoryStore::new());
        let clock = MockClock::at(0);
        let redirector = Arc::new(RecordingRedirector::new());

        let manager = TokenManager::new(client.clone(), store.clone(), redirector.clone())
            .with_clock(Arc::new(clock.clone()));

        Harness { manager, client, store, clock, redirector }
    }

    fn seed_session(store: &MemoryStore, access: &str, refresh: Option<&str>, expiry: &str) {
        store.set("spotify_access_token", access).unwrap();
        store.set("spotify_token_expiry", expiry).unwrap();
        if let Some(refresh) = refresh {
            store.set("spotify_refresh_token", refresh).unwrap();
        }
    }

    fn stored(store: &MemoryStore, key: &str) -> Option<String> {
        store.get(key).unwrap()
    }

    /// Assertions:
    /// - The verifier is stored and has the configured length.
    /// - The redirect URL carries the verifier's challenge, never the verifier.
    #[test]
    fn test_begin_authorization_stores_verifier_and_redirects() {
        let h = harness();
        h.manager.begin_authorization().unwrap();

        let verifier = stored(&h.store, "code_verifier").unwrap();
        assert_eq!(verifier.len(), 64);

        let url = h.redirector.last_url().unwrap();
        assert!(url.contains(&crate::auth::generate_code_challenge(&verifier)));
        assert!(!url.contains(&verifier));
        assert_eq!(h.manager.state().unwrap(), AuthState::PendingExchange);
    }

    #[test]
    fn test_begin_authorization_replaces_previous_verifier() {
        let h = harness();
        h.manager.begin_authorization().unwrap();
        let first = stored(&h.store, "code_verifier");
        h.manager.begin_authorization().unwrap();

        assert_ne!(stored(&h.store, "code_verifier"), first);
        assert_eq!(h.redirector.urls().len(), 2);
    }

    #[test]
    fn test_begin_authorization_rejects_bad_verifier_length() {
        let h = harness();
        let manager = h.manager.with_verifier_length(20);

        assert!(matches!(manager.begin_authorization(), Err(TokenManagerError::Pkce(_))));
        assert!(h.redirector.urls().is_empty());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_complete_authorization_without_verifier() {
        let h = harness();

        let result = h.manager.complete_authorization("code").await;

        assert!(matches!(result, Err(TokenManagerError::MissingVerifier)));
        assert_eq!(h.client.exchange_calls(), 0);
    }

    /// Assertions:
    /// - Exchange uses the stored verifier.
    /// - Tokens and expiry (issue time + 3600 s) are stored.
    /// - The verifier is deleted.
    #[tokio::test]
    async fn test_complete_authorization_stores_tokens() {
        let h = harness();
        h.clock.set_millis(1_000);
        h.manager.begin_authorization().unwrap();
        let verifier = stored(&h.store, "code_verifier").unwrap();

        let token = h.manager.complete_authorization("auth-code").await.unwrap();

        assert_eq!(token, "mock_access_token");
        assert_eq!(h.client.last_exchange(), Some(("auth-code".to_string(), verifier)));
        assert_eq!(stored(&h.store, "spotify_access_token").as_deref(), Some("mock_access_token"));
        assert_eq!(
            stored(&h.store, "spotify_refresh_token").as_deref(),
            Some("mock_refresh_token")
        );
        assert_eq!(stored(&h.store, "spotify_token_expiry").as_deref(), Some("3601000"));
        assert_eq!(stored(&h.store, "code_verifier"), None);
        assert_eq!(h.manager.state().unwrap(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_complete_authorization_failure_keeps_verifier() {
        let h = harness();
        h.client.fail_exchange();
        h.manager.begin_authorization().unwrap();

        let result = h.manager.complete_authorization("bad-code").await;

        assert!(matches!(result, Err(TokenManagerError::TokenExchangeFailed(_))));
        assert!(stored(&h.store, "code_verifier").is_some());
        assert_eq!(stored(&h.store, "spotify_access_token"), None);
    }

    #[tokio::test]
    async fn test_complete_authorization_drops_stale_refresh_token() {
        let h = harness();
        seed_session(&h.store, "old", Some("stale-refresh"), "10");
        h.client.set_exchange_response(TokenSet::new("fresh".into(), None, 3600, None));
        h.manager.begin_authorization().unwrap();

        h.manager.complete_authorization("code").await.unwrap();

        assert_eq!(stored(&h.store, "spotify_refresh_token"), None);
    }

    #[tokio::test]
    async fn test_get_valid_access_token_not_authenticated() {
        let h = harness();
        assert_eq!(h.manager.get_valid_access_token().await, TokenStatus::NotAuthenticated);
        assert_eq!(h.manager.state().unwrap(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_missing_expiry_is_not_authenticated() {
        let h = harness();
        h.store.set("spotify_access_token", "orphan").unwrap();

        assert_eq!(h.manager.get_valid_access_token().await, TokenStatus::NotAuthenticated);
        assert_eq!(h.client.refresh_calls(), 0);
    }

    /// Token stored at t=0 with expires_in=3600: valid at 3_599_000 ms,
    /// refreshed at 3_601_000 ms.
    #[tokio::test]
    async fn test_expiry_boundary_triggers_refresh() {
        let h = harness();
        h.manager.begin_authorization().unwrap();
        h.manager.complete_authorization("code").await.unwrap();

        h.clock.set_millis(3_599_000);
        assert_eq!(
            h.manager.get_valid_access_token().await,
            TokenStatus::Valid("mock_access_token".into())
        );
        assert_eq!(h.client.refresh_calls(), 0);

        h.clock.set_millis(3_601_000);
        assert_eq!(h.manager.state().unwrap(), AuthState::Expired);
        assert_eq!(
            h.manager.get_valid_access_token().await,
            TokenStatus::Valid("refreshed_access_token".into())
        );
        assert_eq!(h.client.refresh_calls(), 1);
        assert_eq!(h.client.last_refresh_token().as_deref(), Some("mock_refresh_token"));
        assert_eq!(stored(&h.store, "spotify_token_expiry").as_deref(), Some("7201000"));
    }

    #[tokio::test]
    async fn test_expiry_equal_to_now_is_expired() {
        let h = harness();
        seed_session(&h.store, "old", Some("r"), "5000");
        h.clock.set_millis(5_000);

        let status = h.manager.get_valid_access_token().await;

        assert_eq!(status, TokenStatus::Valid("refreshed_access_token".into()));
    }

    #[tokio::test]
    async fn test_unreadable_expiry_triggers_refresh() {
        let h = harness();
        seed_session(&h.store, "old", Some("r"), "not-a-number");

        let status = h.manager.get_valid_access_token().await;

        assert_eq!(status, TokenStatus::Valid("refreshed_access_token".into()));
        assert_eq!(h.client.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_not_rotated() {
        let h = harness();
        seed_session(&h.store, "old", Some("keep-me"), "0");
        h.client.set_refresh_response(TokenSet::new("new".into(), None, 3600, None));

        h.manager.refresh().await.unwrap();

        assert_eq!(stored(&h.store, "spotify_refresh_token").as_deref(), Some("keep-me"));
        assert_eq!(stored(&h.store, "spotify_access_token").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_refresh_replaces_rotated_refresh_token() {
        let h = harness();
        seed_session(&h.store, "old", Some("r1"), "0");
        h.client.set_refresh_response(TokenSet::new("new".into(), Some("r2".into()), 3600, None));

        h.manager.refresh().await.unwrap();

        assert_eq!(stored(&h.store, "spotify_refresh_token").as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let h = harness();
        seed_session(&h.store, "old", None, "0");

        let result = h.manager.refresh().await;

        assert!(matches!(result, Err(TokenManagerError::NoRefreshToken)));
        assert_eq!(h.client.refresh_calls(), 0);
        assert!(stored(&h.store, "spotify_access_token").is_some());
    }

    #[tokio::test]
    async fn test_direct_refresh_failure_does_not_purge() {
        let h = harness();
        seed_session(&h.store, "old", Some("r"), "0");
        h.client.fail_refresh();

        let result = h.manager.refresh().await;

        assert!(matches!(result, Err(TokenManagerError::RefreshFailed(_))));
        assert_eq!(stored(&h.store, "spotify_refresh_token").as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let h = harness();
        seed_session(&h.store, "old", Some("revoked"), "0");
        h.store.set("unrelated", "stays").unwrap();
        h.client.fail_refresh();

        let status = h.manager.get_valid_access_token().await;

        assert_eq!(status, TokenStatus::SessionExpired);
        assert_eq!(status.access_token(), None);
        assert_eq!(stored(&h.store, "spotify_access_token"), None);
        assert_eq!(stored(&h.store, "spotify_refresh_token"), None);
        assert_eq!(stored(&h.store, "spotify_token_expiry"), None);
        assert_eq!(stored(&h.store, "unrelated").as_deref(), Some("stays"));
        assert_eq!(h.manager.get_valid_access_token().await, TokenStatus::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_clears_session() {
        let h = harness();
        seed_session(&h.store, "old", None, "0");

        assert_eq!(h.manager.get_valid_access_token().await, TokenStatus::SessionExpired);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let h = harness();
        seed_session(&h.store, "a", Some("r"), "99999999");

        h.manager.logout().unwrap();
        h.manager.logout().unwrap();

        assert!(h.store.is_empty());
        assert_eq!(h.manager.get_valid_access_token().await, TokenStatus::NotAuthenticated);
        assert_eq!(h.client.refresh_calls(), 0);
        assert_eq!(h.client.exchange_calls(), 0);
    }

    /// Assertions:
    /// - Logging out while a refresh waits on the token endpoint wins.
    /// - The in-flight caller gets no token and nothing is written back.
    #[tokio::test]
    async fn test_logout_during_refresh_discards_new_tokens() {
        let h = harness();
        seed_session(&h.store, "old", Some("r"), "0");
        h.client.set_refresh_delay(Duration::from_millis(100));
        let manager = Arc::new(h.manager);

        let task = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_valid_access_token().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.logout().unwrap();

        assert_eq!(task.await.unwrap(), TokenStatus::NotAuthenticated);
        assert_eq!(h.client.refresh_calls(), 1);
        assert!(h.store.is_empty());
        assert_eq!(manager.state().unwrap(), AuthState::Unauthenticated);
        assert_eq!(manager.get_valid_access_token().await, TokenStatus::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_direct_refresh_after_logout_reports_session_cleared() {
        let h = harness();
        seed_session(&h.store, "old", Some("r"), "0");
        h.client.set_refresh_delay(Duration::from_millis(100));
        let manager = Arc::new(h.manager);

        let task = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.logout().unwrap();

        assert!(matches!(task.await.unwrap(), Err(TokenManagerError::SessionCleared)));
        assert_eq!(stored(&h.store, "spotify_access_token"), None);
    }

    /// Store whose deletes always fail.
    struct ReadOnlyDeletes {
        inner: MemoryStore,
    }

    impl KeyValueStore for ReadOnlyDeletes {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.inner.set(key, value)
        }

        fn delete(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::io("store.json", std::io::Error::other("read-only")))
        }

        fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
            self.inner.set_many(entries)
        }
    }

    #[tokio::test]
    async fn test_failed_stale_refresh_delete_stores_nothing() {
        let client = MockOAuthClient::new();
        client.set_exchange_response(TokenSet::new("fresh".into(), None, 3600, None));
        let store = Arc::new(ReadOnlyDeletes { inner: MemoryStore::new() });
        seed_session(&store.inner, "old", Some("stale-refresh"), "10");
        let manager =
            TokenManager::new(client, store.clone(), Arc::new(RecordingRedirector::new()));
        manager.begin_authorization().unwrap();

        let result = manager.complete_authorization("code").await;

        assert!(matches!(result, Err(TokenManagerError::Storage(_))));
        assert_eq!(store.get("spotify_access_token").unwrap().as_deref(), Some("old"));
        assert_eq!(store.get("spotify_token_expiry").unwrap().as_deref(), Some("10"));
        assert!(store.get("code_verifier").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_custom_storage_keys() {
        let h = harness();
        let keys = StorageKeys {
            code_verifier: "pkce".into(),
            access_token: "at".into(),
            refresh_token: "rt".into(),
            token_expiry: "exp".into(),
        };
        let manager = h.manager.with_storage_keys(keys);

        manager.begin_authorization().unwrap();
        assert!(stored(&h.store, "pkce").is_some());

        manager.complete_authorization("code").await.unwrap();
        assert_eq!(stored(&h.store, "at").as_deref(), Some("mock_access_token"));
        assert_eq!(stored(&h.store, "spotify_access_token"), None);
    }

    /// Assertions:
    /// - Two concurrent callers on an expired token both get the new token.
    /// - Exactly one refresh request is made.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_refresh_is_single_flight() {
        let h = harness();
        seed_session(&h.store, "old", Some("r"), "0");
        h.client.set_refresh_delay(Duration::from_millis(50));

        let (a, b) =
            tokio::join!(h.manager.get_valid_access_token(), h.manager.get_valid_access_token());

        assert_eq!(a, TokenStatus::Valid("refreshed_access_token".into()));
        assert_eq!(b, TokenStatus::Valid("refreshed_access_token".into()));
        assert_eq!(h.client.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_state_reports_refreshing_while_refresh_runs() {
        let h = harness();
        seed_session(&h.store, "old", Some("r"), "0");
        h.client.set_refresh_delay(Duration::from_millis(100));
        let manager = Arc::new(h.manager);

        let task = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_valid_access_token().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(manager.state().unwrap(), AuthState::Refreshing);
        assert!(task.await.unwrap().is_authenticated());
        assert_eq!(manager.state().unwrap(), AuthState::Authenticated);
    }
}
