//! # minihome Infrastructure
//!
//! Infrastructure implementations around the minihome domain.
//!
//! This crate contains:
//! - Configuration loading (environment, TOML/JSON files)
//! - The Spotify search integration and session facade
//! - Playlist persistence over the shared key-value store
//! - Conversions from library errors into `MiniHomeError`
//!
//! ## Architecture
//! - Depends on `minihome-domain` and `minihome-common`
//! - Contains all "impure" code (HTTP, file I/O)

pub mod config;
pub mod errors;
pub mod integrations;
pub mod playlist;

// Re-export commonly used items
pub use errors::InfraError;
pub use integrations::spotify::{SearchError, SpotifySearchClient, SpotifyService, Track};
pub use playlist::PlaylistStore;
