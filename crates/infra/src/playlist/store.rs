//! Playlist repository over a [`KeyValueStore`]

use std::sync::Arc;

use chrono::Utc;
use minihome_common::storage::KeyValueStore;
use minihome_domain::constants::PLAYLIST_STORAGE_KEY;
use minihome_domain::{MiniHomeError, NewSong, PlaylistSong, Result};
use tracing::{debug, info};

use crate::errors::InfraError;

/// Reads and edits the stored playlist.
///
/// Every call reads the current array from the store, so edits made by
/// another handle on the same store are never lost between calls.
pub struct PlaylistStore<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    key: String,
}

impl<S: KeyValueStore + ?Sized> PlaylistStore<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store, key: PLAYLIST_STORAGE_KEY.to_string() }
    }

    /// Use a different storage key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// All songs in insertion order. An absent key is an empty playlist.
    ///
    /// # Errors
    /// Returns `MiniHomeError::Storage` when the store fails or the stored
    /// value is not a playlist array.
    pub fn songs(&self) -> Result<Vec<PlaylistSong>> {
        let Some(raw) = self.store.get(&self.key).map_err(InfraError::from)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|e| {
            MiniHomeError::Storage(format!("playlist under '{}' is unreadable: {e}", self.key))
        })
    }

    /// Validate `song`, stamp it with a fresh id and the current time, and
    /// append it.
    ///
    /// # Errors
    /// Returns `MiniHomeError::InvalidInput` for a blank title or artist,
    /// or `MiniHomeError::Storage` when the playlist cannot be saved.
    pub fn add(&self, song: NewSong) -> Result<PlaylistSong> {
        let song = PlaylistSong::create(song, Utc::now())?;

        let mut songs = self.songs()?;
        songs.push(song.clone());
        self.save(&songs)?;

        info!(id = %song.id, count = songs.len(), "Added song to playlist");
        Ok(song)
    }

    /// Remove the song with `id`. Returns `false` when no song matched.
    ///
    /// # Errors
    /// Returns `MiniHomeError::Storage` when the playlist cannot be read or
    /// saved.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut songs = self.songs()?;
        let before = songs.len();
        songs.retain(|song| song.id != id);

        if songs.len() == before {
            debug!(id, "No playlist song to remove");
            return Ok(false);
        }

        self.save(&songs)?;
        info!(id, count = songs.len(), "Removed song from playlist");
        Ok(true)
    }

    fn save(&self, songs: &[PlaylistSong]) -> Result<()> {
        let raw = serde_json::to_string(songs)
            .map_err(|e| MiniHomeError::Internal(format!("failed to encode playlist: {e}")))?;
        self.store.set(&self.key, &raw).map_err(InfraError::from)?;
        Ok(())
    }
}
