//! Session plumbing shared across minihome crates.
//!
//! - [`auth`]: PKCE authorization, token endpoint client, token lifecycle
//! - [`storage`]: injectable key-value stores
//! - [`clock`]: wall-clock abstraction for expiry checks
//! - `testing`: mocks for the above (feature `test-utils`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod clock;
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{TokenManager, TokenManagerError, TokenStatus};
pub use clock::{Clock, SystemClock};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
