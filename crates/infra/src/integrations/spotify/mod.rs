//! Spotify Web API integration
//!
//! - [`client`]: track search against `/v1/search`
//! - [`types`]: search response payloads
//! - [`service`]: session-aware facade combining the token manager and search

pub mod client;
pub mod service;
pub mod types;

pub use client::{SearchError, SpotifySearchClient};
pub use service::{CallbackOutcome, SpotifyService};
pub use types::{Album, Artist, Image, Track};
