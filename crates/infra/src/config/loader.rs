//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required client id is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, fields that are not given keep their defaults and
//! the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `MINIHOME_SPOTIFY_CLIENT_ID`: Spotify client id (required)
//! - `MINIHOME_SPOTIFY_REDIRECT_URI`: Registered redirect URI
//! - `MINIHOME_SPOTIFY_SCOPES`: Space or comma separated scopes
//! - `MINIHOME_SPOTIFY_AUTHORIZE_URL`: Authorize endpoint
//! - `MINIHOME_SPOTIFY_TOKEN_URL`: Token endpoint
//! - `MINIHOME_SPOTIFY_SEARCH_URL`: Search endpoint
//! - `MINIHOME_VERIFIER_LENGTH`: PKCE verifier length (43-128)
//! - `MINIHOME_SEARCH_LIMIT`: Tracks per search (1-50)
//! - `MINIHOME_STORAGE_PATH`: JSON file backing the key-value store
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./minihome.toml`, `./minihome.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use minihome_domain::{Config, MiniHomeError, Result};

/// File names probed in every candidate directory
const CONFIG_FILE_NAMES: &[&str] = &["minihome.toml", "minihome.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// client id is missing there, falls back to loading from a config file.
///
/// # Errors
/// Returns `MiniHomeError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<Config> {
    // Try loading from environment first
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            // Fall back to file
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `MINIHOME_SPOTIFY_CLIENT_ID` is required; everything else falls
/// back to the defaults.
///
/// # Errors
/// Returns `MiniHomeError::Config` if the client id is missing or a value is
/// invalid.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    let spotify = &mut config.spotify;

    spotify.client_id = env_var("MINIHOME_SPOTIFY_CLIENT_ID")?;

    if let Some(uri) = env_opt("MINIHOME_SPOTIFY_REDIRECT_URI") {
        spotify.redirect_uri = uri;
    }
    if let Some(scopes) = env_opt("MINIHOME_SPOTIFY_SCOPES") {
        spotify.scopes = parse_scopes(&scopes);
    }
    if let Some(url) = env_opt("MINIHOME_SPOTIFY_AUTHORIZE_URL") {
        spotify.authorize_url = url;
    }
    if let Some(url) = env_opt("MINIHOME_SPOTIFY_TOKEN_URL") {
        spotify.token_url = url;
    }
    if let Some(url) = env_opt("MINIHOME_SPOTIFY_SEARCH_URL") {
        spotify.search_url = url;
    }
    if let Some(length) = env_opt("MINIHOME_VERIFIER_LENGTH") {
        spotify.verifier_length = length.parse::<usize>().map_err(|e| {
            MiniHomeError::Config(format!("Invalid verifier length '{length}': {e}"))
        })?;
    }
    if let Some(limit) = env_opt("MINIHOME_SEARCH_LIMIT") {
        spotify.search_limit = limit
            .parse::<u32>()
            .map_err(|e| MiniHomeError::Config(format!("Invalid search limit '{limit}': {e}")))?;
    }
    if let Some(path) = env_opt("MINIHOME_STORAGE_PATH") {
        config.storage.path = path;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `MiniHomeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MiniHomeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MiniHomeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MiniHomeError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `MiniHomeError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MiniHomeError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MiniHomeError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MiniHomeError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory and its ancestors
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.is_file())
}

/// Config file candidates in `dir`, its parent and its grandparent.
fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    dir.ancestors()
        .take(3)
        .flat_map(|base| CONFIG_FILE_NAMES.iter().map(move |name| base.join(name)))
        .collect()
}

/// Split a scope list on whitespace or commas.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `MiniHomeError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        MiniHomeError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional environment variable; blank counts as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
