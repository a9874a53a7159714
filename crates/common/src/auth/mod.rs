//! OAuth 2.0 + PKCE session handling for the Spotify integration
//!
//! The blog is a public client: it cannot hold a client secret, so every
//! authorization goes through PKCE (RFC 7636). This module owns the whole
//! credential lifecycle, from the authorize redirect to silent refresh.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  Credential lifecycle + single-flight refresh
//! └────────┬────────┘
//!          │
//!          ├──► OAuthClientTrait   (token endpoint, authorize URL)
//!          ├──► KeyValueStore      (verifier, tokens, expiry)
//!          ├──► Redirector         (user-agent navigation)
//!          └──► Clock              (expiry checks)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use minihome_common::auth::{
//!     OAuthClient, OAuthConfig, Redirector, TokenManager, TokenStatus,
//! };
//! use minihome_common::storage::MemoryStore;
//!
//! struct PrintRedirector;
//!
//! impl Redirector for PrintRedirector {
//!     fn redirect(&self, url: &str) {
//!         println!("Open {url}");
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OAuthConfig::new(
//!     "client-id".to_string(),
//!     "https://localhost:5173/callback".to_string(),
//!     vec!["user-read-private".to_string()],
//!     "https://accounts.spotify.com/authorize".to_string(),
//!     "https://accounts.spotify.com/api/token".to_string(),
//! );
//! let manager = TokenManager::new(
//!     OAuthClient::new(config),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(PrintRedirector),
//! );
//!
//! manager.begin_authorization()?;
//! // ... the user approves and the redirect carries ?code=...
//! manager.complete_authorization("code-from-redirect").await?;
//!
//! if let TokenStatus::Valid(token) = manager.get_valid_access_token().await {
//!     println!("bearer {token}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenSet`, `OAuthConfig`, `TokenStatus`, `AuthState`
//! - **[`pkce`]**: verifier and challenge generation
//! - **[`client`]**: HTTP client for the authorize URL and token endpoint
//! - **[`callback`]**: parsing and cleaning the redirect URL
//! - **[`token_manager`]**: the lifecycle manager

pub mod callback;
pub mod client;
pub mod pkce;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use callback::{parse_callback, strip_callback_params, CallbackParams};
pub use client::{OAuthClient, OAuthClientError};
pub use pkce::{generate_code_challenge, generate_code_verifier, PkceChallenge, PkceError};
pub use token_manager::{StorageKeys, TokenManager, TokenManagerError};
pub use traits::{OAuthClientTrait, Redirector};
pub use types::{
    AuthState, OAuthConfig, OAuthError, StoredCredentials, TokenResponse, TokenSet, TokenStatus,
};
