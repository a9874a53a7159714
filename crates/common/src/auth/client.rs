//! OAuth 2.0 client for the PKCE authorization-code flow
//!
//! Handles the two halves of the flow that talk to the provider:
//! - Building the browser authorization URL from a code challenge
//! - Posting form bodies to the token endpoint (code exchange and refresh)

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// Token endpoint answered with a non-success status
    Rejected { status: u16, error: Option<OAuthError> },

    /// Failed to parse response
    ParseError(String),

    /// Response parsed but lacks a usable token or lifetime
    MalformedResponse(String),

    /// No refresh token available
    NoRefreshToken,
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::Rejected { status, error: Some(error) } => {
                write!(f, "Token endpoint rejected request ({status}): {error}")
            }
            Self::Rejected { status, error: None } => {
                write!(f, "Token endpoint rejected request ({status})")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::MalformedResponse(msg) => write!(f, "Malformed token response: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
        }
    }
}

impl std::error::Error for OAuthClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RequestFailed(e) => Some(e),
            Self::Rejected { error: Some(e), .. } => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// OAuth 2.0 public client with PKCE support
///
/// Implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) without a client
/// secret.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with a 30 second request timeout.
    ///
    /// # Examples
    /// ```
    /// use minihome_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new(
    ///     "client_id".to_string(),
    ///     "https://localhost:5173/callback".to_string(),
    ///     vec!["user-read-private".to_string()],
    ///     "https://accounts.spotify.com/authorize".to_string(),
    ///     "https://accounts.spotify.com/api/token".to_string(),
    /// );
    /// let client = OAuthClient::new(config);
    /// assert_eq!(client.redirect_uri(), "https://localhost:5173/callback");
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Build the authorize URL for `code_challenge`.
    ///
    /// The verifier never appears here; only its S256 challenge does.
    #[must_use]
    pub fn authorization_url(&self, code_challenge: &str) -> String {
        let scope_string = self.config.scope_string();

        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("scope", scope_string.as_str()),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.config.authorize_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query_string}", self.config.authorize_url)
    }

    /// Exchange an authorization code and its verifier for tokens.
    ///
    /// # Errors
    /// Returns error if:
    /// - The request cannot be sent
    /// - The endpoint answers with a non-success status
    /// - The body is not a usable token response
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!(token_url = %self.config.token_url, "Exchanging authorization code");
        let response = self.client.post(&self.config.token_url).form(&form).send().await?;

        Self::parse_token_response(response).await
    }

    /// Refresh access token using refresh token
    ///
    /// # Errors
    /// Returns error if:
    /// - No refresh token provided
    /// - The endpoint rejects the refresh token
    /// - The body is not a usable token response
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        debug!(token_url = %self.config.token_url, "Refreshing access token");
        let response = self.client.post(&self.config.token_url).form(&form).send().await?;

        Self::parse_token_response(response).await
    }

    async fn parse_token_response(response: Response) -> Result<TokenSet, OAuthClientError> {
        let status = response.status();

        if !status.is_success() {
            // Error bodies are optional; keep the status even when they don't parse.
            let error = response.json::<OAuthError>().await.ok();
            debug!(status = status.as_u16(), "Token endpoint returned an error status");
            return Err(OAuthClientError::Rejected { status: status.as_u16(), error });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        TokenSet::try_from(token_response)
    }

    /// Get the configured redirect URI
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    fn authorization_url(&self, code_challenge: &str) -> String {
        self.authorization_url(code_challenge)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.exchange_code(code, code_verifier).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uri()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::client.
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn create_test_config(token_url: String) -> OAuthConfig {
        OAuthConfig::new(
            "test_client_id".to_string(),
            "https://localhost:5173/callback".to_string(),
            vec!["user-read-private".to_string(), "user-read-email".to_string()],
            "https://accounts.spotify.com/authorize".to_string(),
            token_url,
        )
    }

    /// Assertions:
    /// - Every authorize parameter is present and URL-encoded.
    /// - The verifier is absent.
    #[test]
    fn test_authorization_url() {
        let client = OAuthClient::new(create_test_config("http://unused/token".into()));
        let url = client.authorization_url("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");

        assert!(url.starts_with("https://accounts.spotify.com/authorize?response_type=code&"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("scope=user-read-private%20user-read-email"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Flocalhost%3A5173%2Fcallback"));
        assert!(!url.contains("code_verifier"));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("client_id=test_client_id"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .and(body_string_contains(
                "redirect_uri=https%3A%2F%2Flocalhost%3A5173%2Fcallback",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(format!("{}/api/token", server.uri())));
        let tokens = client.exchange_code("auth-code", "the-verifier").await.unwrap();

        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(tokens.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_refresh_posts_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .and(body_string_contains("client_id=test_client_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-2",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(format!("{}/api/token", server.uri())));
        let tokens = client.refresh_access_token("refresh-1").await.unwrap();

        assert_eq!(tokens.access_token, "access-2");
        assert_eq!(tokens.refresh_token, None);
    }

    #[tokio::test]
    async fn test_rejected_with_oauth_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(format!("{}/api/token", server.uri())));
        let err = client.exchange_code("bad", "verifier").await.unwrap_err();

        match err {
            OAuthClientError::Rejected { status, error: Some(error) } => {
                assert_eq!(status, 400);
                assert_eq!(error.error, "invalid_grant");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(format!("{}/api/token", server.uri())));
        let err = client.refresh_access_token("refresh").await.unwrap_err();

        assert!(matches!(err, OAuthClientError::Rejected { status: 503, error: None }));
    }

    #[tokio::test]
    async fn test_success_without_access_token_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"expires_in": 3600})),
            )
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(format!("{}/api/token", server.uri())));
        let err = client.exchange_code("code", "verifier").await.unwrap_err();

        assert!(matches!(err, OAuthClientError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_success_with_invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = OAuthClient::new(create_test_config(format!("{}/api/token", server.uri())));
        let err = client.exchange_code("code", "verifier").await.unwrap_err();

        assert!(matches!(err, OAuthClientError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_refresh_with_empty_token() {
        let client = OAuthClient::new(create_test_config("http://unused/token".into()));

        let result = client.refresh_access_token("").await;
        assert!(matches!(result, Err(OAuthClientError::NoRefreshToken)));
    }
}
