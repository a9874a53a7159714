//! Testing utilities and helpers
//!
//! Available to other crates through the `test-utils` feature:
//! - **[`mocks`]**: `MockOAuthClient` and `RecordingRedirector`
//! - **[`time`]**: `MockClock` with settable epoch milliseconds
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use minihome_common::auth::TokenManager;
//! use minihome_common::storage::MemoryStore;
//! use minihome_common::testing::{MockClock, MockOAuthClient, RecordingRedirector};
//!
//! let clock = MockClock::at(0);
//! let manager = TokenManager::new(
//!     MockOAuthClient::new(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(RecordingRedirector::new()),
//! )
//! .with_clock(Arc::new(clock.clone()));
//!
//! manager.begin_authorization().unwrap();
//! clock.advance(std::time::Duration::from_secs(5));
//! ```

pub mod mocks;
pub mod time;

pub use mocks::{MockOAuthClient, RecordingRedirector};
pub use time::MockClock;
