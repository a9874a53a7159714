//! Traits at the token manager's seams
//!
//! These traits enable dependency injection and testing by abstracting the
//! OAuth provider and the user agent.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenSet;

/// Trait for OAuth client operations
///
/// Abstracts the provider so the token manager can be tested against a mock.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Build the authorize URL carrying `code_challenge`.
    fn authorization_url(&self, code_challenge: &str) -> String;

    /// Exchange authorization code and verifier for tokens
    ///
    /// # Errors
    /// Returns error if the token exchange fails or the response is unusable
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, OAuthClientError>;

    /// Refresh access token using refresh token
    ///
    /// The returned `TokenSet` carries a refresh token only if the server
    /// rotated it.
    ///
    /// # Errors
    /// Returns error if refresh fails or token is invalid/revoked
    async fn refresh_access_token(&self, refresh_token: &str)
        -> Result<TokenSet, OAuthClientError>;

    /// Get the configured redirect URI
    fn redirect_uri(&self) -> &str;
}

/// Sends the user agent to a URL.
///
/// In a browser this is a page navigation; a CLI prints the URL or opens a
/// browser.
pub trait Redirector: Send + Sync {
    fn redirect(&self, url: &str);
}
