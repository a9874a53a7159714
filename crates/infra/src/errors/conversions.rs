//! Conversions from library errors into domain errors.

use minihome_common::auth::{OAuthClientError, TokenManagerError};
use minihome_common::storage::StorageError;
use minihome_domain::MiniHomeError;
use reqwest::Error as HttpError;

use crate::integrations::spotify::SearchError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MiniHomeError);

impl From<InfraError> for MiniHomeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MiniHomeError> for InfraError {
    fn from(value: MiniHomeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoMiniHomeError {
    fn into_minihome(self) -> MiniHomeError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MiniHomeError */
/* -------------------------------------------------------------------------- */

impl IntoMiniHomeError for HttpError {
    fn into_minihome(self) -> MiniHomeError {
        if self.is_timeout() {
            return MiniHomeError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return MiniHomeError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status.as_u16());
        }

        MiniHomeError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_minihome())
    }
}

fn status_error(code: u16) -> MiniHomeError {
    let reason = reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("unknown status");
    let message = format!("HTTP {code} {reason}");

    match code {
        401 | 403 => MiniHomeError::Auth(message),
        404 => MiniHomeError::NotFound(message),
        400..=499 if code != 429 => MiniHomeError::InvalidInput(message),
        _ => MiniHomeError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* OAuthClientError → MiniHomeError */
/* -------------------------------------------------------------------------- */

impl IntoMiniHomeError for OAuthClientError {
    fn into_minihome(self) -> MiniHomeError {
        let description = self.to_string();

        match self {
            OAuthClientError::RequestFailed(err) => err.into_minihome(),
            OAuthClientError::Rejected { .. } | OAuthClientError::NoRefreshToken => {
                MiniHomeError::Auth(description)
            }
            OAuthClientError::ParseError(_) | OAuthClientError::MalformedResponse(_) => {
                MiniHomeError::Network(description)
            }
        }
    }
}

/* -------------------------------------------------------------------------- */
/* TokenManagerError → MiniHomeError */
/* -------------------------------------------------------------------------- */

impl IntoMiniHomeError for TokenManagerError {
    fn into_minihome(self) -> MiniHomeError {
        match self {
            TokenManagerError::MissingVerifier => MiniHomeError::Auth(
                "no authorization in progress; start the login again".into(),
            ),
            TokenManagerError::TokenExchangeFailed(err) => match err.into_minihome() {
                MiniHomeError::Auth(msg) => {
                    MiniHomeError::Auth(format!("authorization code exchange failed: {msg}"))
                }
                other => other,
            },
            TokenManagerError::NoRefreshToken => {
                MiniHomeError::NotAuthenticated("no refresh token stored".into())
            }
            TokenManagerError::SessionCleared => {
                MiniHomeError::NotAuthenticated("logged out during token refresh".into())
            }
            TokenManagerError::RefreshFailed(err) => match err.into_minihome() {
                MiniHomeError::Auth(msg) => {
                    MiniHomeError::Auth(format!("token refresh failed: {msg}"))
                }
                other => other,
            },
            TokenManagerError::Storage(err) => err.into_minihome(),
            TokenManagerError::Pkce(err) => MiniHomeError::Config(err.to_string()),
        }
    }
}

impl From<TokenManagerError> for InfraError {
    fn from(value: TokenManagerError) -> Self {
        InfraError(value.into_minihome())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → MiniHomeError */
/* -------------------------------------------------------------------------- */

impl IntoMiniHomeError for StorageError {
    fn into_minihome(self) -> MiniHomeError {
        MiniHomeError::Storage(self.to_string())
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_minihome())
    }
}

/* -------------------------------------------------------------------------- */
/* SearchError → MiniHomeError */
/* -------------------------------------------------------------------------- */

impl From<SearchError> for MiniHomeError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::SearchFailed { status } => status_error(status),
            SearchError::Request(err) => err.into_minihome(),
            SearchError::Parse(msg) => {
                MiniHomeError::Network(format!("unexpected Spotify search response: {msg}"))
            }
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
