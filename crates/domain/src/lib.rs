//! # minihome Domain
//!
//! Domain types and models for the minihome blog.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Playlist types and the song input rules
//! - Domain constants and small formatting helpers
//!
//! ## Architecture
//! - No dependencies on other minihome crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::format::format_duration;
