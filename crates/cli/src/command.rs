//! Command-line argument parsing

use anyhow::{anyhow, bail};

/// One invocation of the `minihome` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Callback { url: String },
    Status,
    Token,
    Search { query: String },
    AddTrack { query: String },
    AddSong { title: String, artist: String, album: Option<String>, duration: Option<String> },
    RemoveSong { id: String },
    Playlist,
    Logout,
    Help,
}

impl Command {
    /// Parse the arguments that follow the binary name.
    ///
    /// Search queries take every remaining argument, so quoting is optional.
    ///
    /// # Errors
    /// Returns an error for an unknown command or a missing argument.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Help);
        };

        let command = match name.as_str() {
            "login" => Self::Login,
            "callback" => Self::Callback { url: required(rest, 0, "redirect URL")? },
            "status" => Self::Status,
            "token" => Self::Token,
            "search" => Self::Search { query: query(rest)? },
            "add-track" => Self::AddTrack { query: query(rest)? },
            "add-song" => Self::AddSong {
                title: required(rest, 0, "title")?,
                artist: required(rest, 1, "artist")?,
                album: rest.get(2).cloned(),
                duration: rest.get(3).cloned(),
            },
            "remove-song" => Self::RemoveSong { id: required(rest, 0, "song id")? },
            "playlist" => Self::Playlist,
            "logout" => Self::Logout,
            "help" | "--help" | "-h" => Self::Help,
            unknown => bail!("Unknown command: {unknown}"),
        };

        Ok(command)
    }
}

fn required(args: &[String], index: usize, what: &str) -> anyhow::Result<String> {
    args.get(index).cloned().ok_or_else(|| anyhow!("Missing argument: {what}"))
}

fn query(args: &[String]) -> anyhow::Result<String> {
    let query = args.join(" ");
    if query.trim().is_empty() {
        bail!("Missing argument: search query");
    }
    Ok(query)
}
