//! Playlist songs as the blog persists them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{MiniHomeError, Result};

/// A song stored in the blog playlist.
///
/// Field names are camelCase on the wire so playlists saved by the browser
/// version of the blog load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSong {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Display duration (`m:ss`), not milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_id: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Input for a new playlist entry, either typed by hand or mapped from a
/// search result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration: Option<String>,
    pub cover_image: Option<String>,
    pub spotify_id: Option<String>,
}

impl NewSong {
    /// Create a song with the two required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self { title: title.into(), artist: artist.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    /// Trim every field and drop optional ones that end up blank.
    ///
    /// # Errors
    /// Returns `MiniHomeError::InvalidInput` when the title or artist is
    /// blank.
    pub fn normalized(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let artist = self.artist.trim().to_string();

        if title.is_empty() || artist.is_empty() {
            return Err(MiniHomeError::InvalidInput(
                "song title and artist are required".to_string(),
            ));
        }

        Ok(Self {
            title,
            artist,
            album: non_blank(self.album),
            duration: non_blank(self.duration),
            cover_image: non_blank(self.cover_image),
            spotify_id: non_blank(self.spotify_id),
        })
    }
}

impl PlaylistSong {
    /// Build a stored song from validated input with a fresh identifier.
    ///
    /// # Errors
    /// Propagates validation failures from [`NewSong::normalized`].
    pub fn create(song: NewSong, added_at: DateTime<Utc>) -> Result<Self> {
        let song = song.normalized()?;

        Ok(Self {
            id: Uuid::now_v7().to_string(),
            title: song.title,
            artist: song.artist,
            album: song.album,
            duration: song.duration,
            cover_image: song.cover_image,
            spotify_id: song.spotify_id,
            added_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
