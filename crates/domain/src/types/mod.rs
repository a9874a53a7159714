//! Domain types and models

pub mod playlist;

pub use playlist::{NewSong, PlaylistSong};
