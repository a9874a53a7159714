//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 with the `S256` method. The verifier stays on the
//! client until the token exchange; only its hash travels to the authorize
//! endpoint.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Shortest verifier RFC 7636 allows
pub const MIN_VERIFIER_LENGTH: usize = 43;

/// Longest verifier RFC 7636 allows
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// RFC 7636 unreserved characters: `A-Z a-z 0-9 - . _ ~`
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// PKCE generation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PkceError {
    #[error(
        "code verifier length must be between {MIN_VERIFIER_LENGTH} and {MAX_VERIFIER_LENGTH}, \
         got {0}"
    )]
    InvalidVerifierLength(usize),
}

/// Generate a code verifier of `length` characters.
///
/// Each character is drawn uniformly from the unreserved set with the
/// thread-local CSPRNG.
///
/// # Errors
/// Returns `PkceError::InvalidVerifierLength` outside 43..=128.
pub fn generate_code_verifier(length: usize) -> Result<String, PkceError> {
    if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
        return Err(PkceError::InvalidVerifierLength(length));
    }

    let mut rng = rand::thread_rng();
    let verifier = (0..length)
        .map(|_| char::from(UNRESERVED[rng.gen_range(0..UNRESERVED.len())]))
        .collect();

    Ok(verifier)
}

/// Generate code challenge from verifier using SHA256
///
/// Per RFC 7636, the challenge is BASE64URL(SHA256(ASCII(code_verifier)))
/// without padding.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Verifier/challenge pair for one authorization attempt.
#[derive(Clone)]
pub struct PkceChallenge {
    /// Kept secret until the token exchange
    pub code_verifier: String,

    /// Sent in the authorization request
    pub code_challenge: String,
}

impl PkceChallenge {
    /// Generate a fresh pair with a verifier of `verifier_length` characters.
    ///
    /// # Examples
    /// ```
    /// use minihome_common::auth::pkce::PkceChallenge;
    ///
    /// let pair = PkceChallenge::generate(64).unwrap();
    /// assert_eq!(pair.code_verifier.len(), 64);
    /// assert_eq!(pair.challenge_method(), "S256");
    /// ```
    ///
    /// # Errors
    /// Returns `PkceError::InvalidVerifierLength` outside 43..=128.
    pub fn generate(verifier_length: usize) -> Result<Self, PkceError> {
        let code_verifier = generate_code_verifier(verifier_length)?;
        let code_challenge = generate_code_challenge(&code_verifier);

        Ok(Self { code_verifier, code_challenge })
    }

    /// Get the challenge method (always "S256" for SHA256)
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}
