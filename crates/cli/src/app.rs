//! Wiring of configuration, storage and services behind the CLI commands

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use minihome_common::auth::{OAuthClient, Redirector};
use minihome_common::storage::FileStore;
use minihome_domain::{format_duration, MiniHomeError, NewSong, PlaylistSong};
use minihome_infra::{config, PlaylistStore, SpotifyService, Track};
use url::Url;

use crate::command::Command;

/// Prints the authorization URL for the user to open in a browser.
struct ConsoleRedirector;

impl Redirector for ConsoleRedirector {
    fn redirect(&self, url: &str) {
        println!("Open this URL to connect Spotify:");
        println!();
        println!("    {url}");
        println!();
        println!("Then run `minihome callback <redirect-url>` with the address you land on.");
    }
}

pub struct App {
    spotify: SpotifyService<OAuthClient, FileStore>,
    playlist: PlaylistStore<FileStore>,
}

impl App {
    /// Load configuration and open the file-backed store.
    ///
    /// # Errors
    /// Fails when no valid configuration is found or the store file is
    /// unreadable.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = config::load().context("Failed to load configuration")?;

        let store = Arc::new(
            FileStore::open(&config.storage.path)
                .with_context(|| format!("Failed to open store at {}", config.storage.path))?,
        );
        tracing::debug!(path = %store.path().display(), "Opened key-value store");

        let spotify = SpotifyService::from_config(
            &config.spotify,
            Arc::clone(&store),
            Arc::new(ConsoleRedirector),
        );
        let playlist = PlaylistStore::new(store);

        Ok(Self { spotify, playlist })
    }

    /// # Errors
    /// Propagates the failure of the command as an `anyhow` error.
    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Login => self.spotify.login()?,
            Command::Callback { url } => {
                let url = Url::parse(&url).with_context(|| format!("Invalid redirect URL: {url}"))?;
                let outcome = self.spotify.handle_callback(&url).await?;
                println!("Spotify connected. Continue at {}", outcome.cleaned_url);
            }
            Command::Status => println!("{}", self.spotify.status()?),
            Command::Token => println!("{}", self.spotify.access_token().await?),
            Command::Search { query } => {
                let tracks = self.spotify.search(&query).await?;
                if tracks.is_empty() {
                    println!("No tracks found for \"{query}\"");
                }
                for (index, track) in tracks.iter().enumerate() {
                    println!("{:>2}. {}", index + 1, describe_track(track));
                }
            }
            Command::AddTrack { query } => {
                let tracks = self.spotify.search(&query).await?;
                let track = tracks
                    .first()
                    .ok_or_else(|| MiniHomeError::NotFound(format!("no track matches \"{query}\"")))?;
                let song = self.playlist.add(NewSong::from(track))?;
                println!("Added {}", describe_song(&song));
            }
            Command::AddSong { title, artist, album, duration } => {
                let song = NewSong { album, duration, ..NewSong::new(title, artist) };
                let song = self.playlist.add(song)?;
                println!("Added {}", describe_song(&song));
            }
            Command::RemoveSong { id } => {
                if self.playlist.remove(&id)? {
                    println!("Removed {id}");
                } else {
                    println!("No song with id {id}");
                }
            }
            Command::Playlist => {
                let songs = self.playlist.songs()?;
                if songs.is_empty() {
                    println!("The playlist is empty");
                }
                for song in &songs {
                    println!("{}", describe_song(song));
                }
            }
            Command::Logout => {
                self.spotify.logout()?;
                println!("Logged out of Spotify");
            }
            Command::Help => {}
        }

        Ok(())
    }
}

fn describe_track(track: &Track) -> String {
    format!(
        "{} - {} ({}, {})",
        track.name,
        track.artist_names(),
        track.album.name,
        format_duration(track.duration_ms)
    )
}

fn describe_song(song: &PlaylistSong) -> String {
    let mut line = format!("[{}] {} - {}", song.id, song.title, song.artist);
    if let Some(album) = &song.album {
        let _ = write!(line, " ({album})");
    }
    if let Some(duration) = &song.duration {
        let _ = write!(line, " {duration}");
    }
    line
}
