//! Session-aware Spotify facade
//!
//! Ties the token manager to the search client so callers deal with one
//! object: log in, handle the redirect, search, log out.

use std::sync::Arc;

use minihome_common::auth::{
    parse_callback, strip_callback_params, AuthState, CallbackParams, OAuthClient, OAuthConfig,
    OAuthClientTrait, Redirector, TokenManager, TokenStatus,
};
use minihome_common::storage::KeyValueStore;
use minihome_domain::{MiniHomeError, Result, SpotifyConfig};
use tracing::{info, warn};
use url::Url;

use super::client::SpotifySearchClient;
use super::types::Track;
use crate::errors::InfraError;

/// Result of handling an authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// The redirect URL without `code`, `state` or error parameters
    pub cleaned_url: Url,
}

/// Spotify login and search for the blog
pub struct SpotifyService<C: OAuthClientTrait + 'static, S: KeyValueStore + 'static> {
    tokens: Arc<TokenManager<C, S>>,
    search: SpotifySearchClient,
}

impl<S: KeyValueStore + 'static> SpotifyService<OAuthClient, S> {
    /// Build the real OAuth and search clients from configuration.
    #[must_use]
    pub fn from_config(
        config: &SpotifyConfig,
        store: Arc<S>,
        redirector: Arc<dyn Redirector>,
    ) -> Self {
        let oauth = OAuthClient::new(OAuthConfig::new(
            config.client_id.clone(),
            config.redirect_uri.clone(),
            config.scopes.clone(),
            config.authorize_url.clone(),
            config.token_url.clone(),
        ));

        let tokens = TokenManager::new(oauth, store, redirector)
            .with_verifier_length(config.verifier_length);
        let search = SpotifySearchClient::new(config.search_url.clone(), config.search_limit);

        Self::new(Arc::new(tokens), search)
    }
}

impl<C: OAuthClientTrait + 'static, S: KeyValueStore + 'static> SpotifyService<C, S> {
    #[must_use]
    pub fn new(tokens: Arc<TokenManager<C, S>>, search: SpotifySearchClient) -> Self {
        Self { tokens, search }
    }

    #[must_use]
    pub fn token_manager(&self) -> &Arc<TokenManager<C, S>> {
        &self.tokens
    }

    /// Start the authorization flow (redirects the user agent).
    ///
    /// # Errors
    /// Returns `Config` for an invalid verifier length, `Storage` if the
    /// verifier cannot be saved.
    pub fn login(&self) -> Result<()> {
        self.tokens.begin_authorization().map_err(InfraError::from)?;
        Ok(())
    }

    /// Handle the URL the provider redirected back to.
    ///
    /// # Errors
    /// - `Auth` if the user denied access or the code exchange failed
    /// - `InvalidInput` if the URL carries neither a code nor an error
    pub async fn handle_callback(&self, redirect: &Url) -> Result<CallbackOutcome> {
        let cleaned_url = strip_callback_params(redirect);

        match parse_callback(redirect) {
            CallbackParams::Code(code) => {
                self.tokens.complete_authorization(&code).await.map_err(InfraError::from)?;
                info!("Spotify account connected");
                Ok(CallbackOutcome { cleaned_url })
            }
            CallbackParams::Denied { error, description } => {
                warn!(error = %error, "Spotify authorization denied");
                let detail = description.map(|d| format!(": {d}")).unwrap_or_default();
                Err(MiniHomeError::Auth(format!("authorization denied ({error}){detail}")))
            }
            CallbackParams::Absent => Err(MiniHomeError::InvalidInput(
                "redirect URL carries no authorization code".to_string(),
            )),
        }
    }

    /// A valid access token, refreshed if necessary.
    ///
    /// # Errors
    /// Returns `NotAuthenticated` when there is no usable session.
    pub async fn access_token(&self) -> Result<String> {
        match self.tokens.get_valid_access_token().await {
            TokenStatus::Valid(token) => Ok(token),
            TokenStatus::NotAuthenticated => Err(MiniHomeError::NotAuthenticated(
                "connect a Spotify account first".to_string(),
            )),
            TokenStatus::SessionExpired => Err(MiniHomeError::NotAuthenticated(
                "the Spotify session expired, log in again".to_string(),
            )),
        }
    }

    /// Search tracks with the current session.
    ///
    /// # Errors
    /// - `NotAuthenticated` when there is no usable session
    /// - `Auth` or `Network` when the search API fails
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let token = self.access_token().await?;
        Ok(self.search.search_tracks(query, &token).await?)
    }

    /// # Errors
    /// Returns `Storage` if the store cannot be read.
    pub fn status(&self) -> Result<AuthState> {
        Ok(self.tokens.state().map_err(InfraError::from)?)
    }

    /// # Errors
    /// Returns `Storage` if a credential cannot be deleted.
    pub fn logout(&self) -> Result<()> {
        self.tokens.logout().map_err(InfraError::from)?;
        Ok(())
    }
}
