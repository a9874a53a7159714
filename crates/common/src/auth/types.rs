//! OAuth 2.0 types and structures
//!
//! Token-endpoint payloads, the client configuration, and the values the
//! token manager hands back to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::client::OAuthClientError;

/// Tokens issued by a successful exchange or refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer credential for API calls
    pub access_token: String,

    /// Present only when the server issued a (new) refresh token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (always "Bearer" for Spotify)
    pub token_type: String,

    /// Access token lifetime in seconds, always positive
    pub expires_in: i64,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a bearer `TokenSet`.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        Self { access_token, refresh_token, token_type: "Bearer".to_string(), expires_in, scope }
    }

    /// Absolute expiry in epoch milliseconds for a token issued at
    /// `issued_at_ms`.
    #[must_use]
    pub fn expires_at_ms(&self, issued_at_ms: u64) -> u64 {
        let lifetime_ms = u64::try_from(self.expires_in).unwrap_or(0).saturating_mul(1000);
        issued_at_ms.saturating_add(lifetime_ms)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// OAuth token response from authorization server
///
/// Every field is optional here so that a response missing `access_token` or
/// `expires_in` is reported as malformed instead of as a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

impl TryFrom<TokenResponse> for TokenSet {
    type Error = OAuthClientError;

    fn try_from(response: TokenResponse) -> Result<Self, Self::Error> {
        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| OAuthClientError::MalformedResponse("missing access_token".into()))?;

        let expires_in = match response.expires_in {
            Some(secs) if secs > 0 => secs,
            Some(secs) => {
                return Err(OAuthClientError::MalformedResponse(format!(
                    "non-positive expires_in: {secs}"
                )))
            }
            None => return Err(OAuthClientError::MalformedResponse("missing expires_in".into())),
        };

        Ok(Self {
            access_token,
            refresh_token: response.refresh_token.filter(|token| !token.is_empty()),
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in,
            scope: response.scope,
        })
    }
}

/// OAuth configuration for the authorization server
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Public client ID (no secret)
    pub client_id: String,

    /// Redirect URI registered with the provider
    pub redirect_uri: String,

    /// OAuth scopes to request
    pub scopes: Vec<String>,

    /// Authorize endpoint the user agent is sent to
    pub authorize_url: String,

    /// Token endpoint for exchange and refresh
    pub token_url: String,
}

impl OAuthConfig {
    /// Create a new OAuth configuration
    #[must_use]
    pub fn new(
        client_id: String,
        redirect_uri: String,
        scopes: Vec<String>,
        authorize_url: String,
        token_url: String,
    ) -> Self {
        Self { client_id, redirect_uri, scopes, authorize_url, token_url }
    }

    /// Get scopes as space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

/// Credentials as read back from storage.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` when the stored expiry could not be parsed
    pub expires_at_ms: Option<u64>,
}

impl StoredCredentials {
    /// An unreadable expiry counts as expired.
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.map_or(true, |expires_at| now_ms >= expires_at)
    }
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// Outcome of asking for a usable access token.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Unexpired bearer token
    Valid(String),
    /// Nothing stored; the user never logged in or logged out
    NotAuthenticated,
    /// A refresh failed and the stored session was discarded
    SessionExpired,
}

impl TokenStatus {
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Valid(token) => Some(token),
            Self::NotAuthenticated | Self::SessionExpired => None,
        }
    }

    #[must_use]
    pub fn into_access_token(self) -> Option<String> {
        match self {
            Self::Valid(token) => Some(token),
            Self::NotAuthenticated | Self::SessionExpired => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

impl fmt::Debug for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(_) => f.write_str("Valid(<redacted>)"),
            Self::NotAuthenticated => f.write_str("NotAuthenticated"),
            Self::SessionExpired => f.write_str("SessionExpired"),
        }
    }
}

/// Position in the authorization lifecycle, derived from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    /// A verifier is stored and waiting for the redirect's code
    PendingExchange,
    Authenticated,
    /// Token stored but past its expiry
    Expired,
    /// A refresh is in flight
    Refreshing,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PendingExchange => "pending exchange",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
            Self::Refreshing => "refreshing",
        };
        f.write_str(label)
    }
}
