//! Spotify track search client

use minihome_domain::constants::{DEFAULT_SEARCH_LIMIT, SPOTIFY_SEARCH_URL};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{SearchResponse, Track};

/// Track search errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// The API answered with a non-success status (401 for a stale token)
    #[error("Spotify search failed with status {status}")]
    SearchFailed { status: u16 },

    #[error("Spotify search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse Spotify search response: {0}")]
    Parse(String),
}

/// Client for `GET /v1/search?type=track`
#[derive(Debug, Clone)]
pub struct SpotifySearchClient {
    client: Client,
    search_url: String,
    limit: u32,
}

impl Default for SpotifySearchClient {
    fn default() -> Self {
        Self::new(SPOTIFY_SEARCH_URL, DEFAULT_SEARCH_LIMIT)
    }
}

impl SpotifySearchClient {
    #[must_use]
    pub fn new(search_url: impl Into<String>, limit: u32) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_client(client, search_url, limit)
    }

    #[must_use]
    pub fn with_client(client: Client, search_url: impl Into<String>, limit: u32) -> Self {
        Self { client, search_url: search_url.into(), limit }
    }

    /// Search tracks matching `query` with a bearer token.
    ///
    /// A blank query returns an empty list without calling the API.
    ///
    /// # Errors
    /// - `SearchFailed` on a non-success status
    /// - `Request` if the request cannot be sent
    /// - `Parse` if the body is not a track search response
    pub async fn search_tracks(
        &self,
        query: &str,
        access_token: &str,
    ) -> Result<Vec<Track>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}?q={}&type=track&limit={}",
            self.search_url,
            urlencoding::encode(query),
            self.limit
        );

        let response = self.client.get(&url).bearer_auth(access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Spotify search rejected");
            return Err(SearchError::SearchFailed { status: status.as_u16() });
        }

        let body: SearchResponse =
            response.json().await.map_err(|e| SearchError::Parse(e.to_string()))?;

        debug!(results = body.tracks.items.len(), "Spotify search completed");
        Ok(body.tracks.items)
    }
}
