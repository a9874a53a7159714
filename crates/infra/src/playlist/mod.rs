//! Blog playlist persistence
//!
//! Songs live as one JSON array under the `blog-playlist` key of the shared
//! key-value store, in the same shape the browser version of the blog wrote.

pub mod store;

pub use store::PlaylistStore;
