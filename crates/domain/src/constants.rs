//! Application constants
//!
//! Centralized location for the domain-level constants used throughout the
//! application.

// Spotify endpoints
pub const SPOTIFY_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_SEARCH_URL: &str = "https://api.spotify.com/v1/search";

// OAuth defaults
pub const DEFAULT_REDIRECT_URI: &str = "https://localhost:5173/callback";
pub const DEFAULT_SCOPES: &[&str] = &["user-read-private", "user-read-email"];
pub const DEFAULT_VERIFIER_LENGTH: usize = 64;
pub const MIN_VERIFIER_LENGTH: usize = 43;
pub const MAX_VERIFIER_LENGTH: usize = 128;

// Search
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 50;

// Persistence
pub const DEFAULT_STORAGE_PATH: &str = "minihome-storage.json";
pub const PLAYLIST_STORAGE_KEY: &str = "blog-playlist";
