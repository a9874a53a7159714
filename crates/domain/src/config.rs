//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_REDIRECT_URI, DEFAULT_SCOPES, DEFAULT_SEARCH_LIMIT, DEFAULT_STORAGE_PATH,
    DEFAULT_VERIFIER_LENGTH, MAX_SEARCH_LIMIT, MAX_VERIFIER_LENGTH, MIN_VERIFIER_LENGTH,
    SPOTIFY_AUTHORIZE_URL, SPOTIFY_SEARCH_URL, SPOTIFY_TOKEN_URL,
};
use crate::errors::{MiniHomeError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub storage: StorageConfig,
}

/// Spotify OAuth and search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub search_url: String,
    /// Length of the PKCE code verifier (43..=128)
    pub verifier_length: usize,
    pub search_limit: u32,
}

/// Key-value storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file that backs the persistent key-value store
    pub path: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            authorize_url: SPOTIFY_AUTHORIZE_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            search_url: SPOTIFY_SEARCH_URL.to_string(),
            verifier_length: DEFAULT_VERIFIER_LENGTH,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: DEFAULT_STORAGE_PATH.to_string() }
    }
}

impl Config {
    /// Check the values that cannot be caught by deserialization alone.
    ///
    /// # Errors
    /// Returns `MiniHomeError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let spotify = &self.spotify;

        if spotify.client_id.trim().is_empty() {
            return Err(MiniHomeError::Config("spotify.client_id must not be empty".into()));
        }

        if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&spotify.verifier_length) {
            return Err(MiniHomeError::Config(format!(
                "spotify.verifier_length must be between {MIN_VERIFIER_LENGTH} and \
                 {MAX_VERIFIER_LENGTH}, got {}",
                spotify.verifier_length
            )));
        }

        if spotify.search_limit == 0 || spotify.search_limit > MAX_SEARCH_LIMIT {
            return Err(MiniHomeError::Config(format!(
                "spotify.search_limit must be between 1 and {MAX_SEARCH_LIMIT}, got {}",
                spotify.search_limit
            )));
        }

        if self.storage.path.trim().is_empty() {
            return Err(MiniHomeError::Config("storage.path must not be empty".into()));
        }

        Ok(())
    }
}
