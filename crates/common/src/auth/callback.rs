//! Redirect callback handling
//!
//! After the user answers the consent screen the provider redirects back to
//! the registered URI with either `?code=...` or `?error=...`. These helpers
//! read that outcome and produce the cleaned URL to show afterwards, so a
//! reload does not replay a single-use code.

use url::Url;

/// Query parameters the provider may append to the redirect URI
const CALLBACK_PARAMS: &[&str] = &["code", "state", "error", "error_description"];

/// What the redirect URL carries.
#[derive(Clone, PartialEq, Eq)]
pub enum CallbackParams {
    /// Authorization code to exchange
    Code(String),
    /// The user or the server declined the authorization
    Denied { error: String, description: Option<String> },
    /// Not an authorization redirect
    Absent,
}

impl std::fmt::Debug for CallbackParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(_) => f.write_str("Code(<redacted>)"),
            Self::Denied { error, description } => f
                .debug_struct("Denied")
                .field("error", error)
                .field("description", description)
                .finish(),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

/// Read the authorization outcome from a redirect URL.
///
/// An `error` parameter wins over `code`. Empty values are ignored.
#[must_use]
pub fn parse_callback(url: &Url) -> CallbackParams {
    let mut code = None;
    let mut error = None;
    let mut description = None;

    for (key, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    match (error, code) {
        (Some(error), _) => CallbackParams::Denied { error, description },
        (None, Some(code)) => CallbackParams::Code(code),
        (None, None) => CallbackParams::Absent,
    }
}

/// Remove the authorization parameters from `url`, keeping everything else.
///
/// The query is dropped entirely when nothing else remains.
#[must_use]
pub fn strip_callback_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut cleaned = url.clone();
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    cleaned
}
