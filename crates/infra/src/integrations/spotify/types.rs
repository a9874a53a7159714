//! Spotify search payloads
//!
//! Only the fields the blog uses are modelled; everything else in the
//! response is ignored.

use minihome_domain::{format_duration, NewSong};
use serde::{Deserialize, Serialize};

/// `GET /v1/search?type=track` response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<Track>,
}

/// A track as returned by search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Album,
    pub duration_ms: u64,
    #[serde(default)]
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    /// Largest first, as Spotify orders them
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Track {
    /// Artist names joined with `", "`.
    #[must_use]
    pub fn artist_names(&self) -> String {
        self.artists.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
    }

    /// Largest album image, if any.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.album.images.first().map(|image| image.url.as_str())
    }
}

impl From<&Track> for NewSong {
    fn from(track: &Track) -> Self {
        Self {
            title: track.name.clone(),
            artist: track.artist_names(),
            album: Some(track.album.name.clone()),
            duration: Some(format_duration(track.duration_ms)),
            cover_image: track.cover_image().map(ToString::to_string),
            spotify_id: Some(track.id.clone()),
        }
    }
}
