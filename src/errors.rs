//! Error type shared by every layer of playlistdl.
//!
//! Fatal conditions (bad credentials, unknown playlist, missing `yt-dlp`)
//! travel up as [`Error`] until the CLI layer prints them. Per-track problems
//! never become an `Error`; the resolver and the downloader record them in
//! their reports instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid playlist: {0}")]
    InvalidPlaylist(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{binary}` not found, is it installed and on PATH? ({source})")]
    MissingDependency {
        binary: String,
        #[source]
        source: which::Error,
    },

    #[error("callback server error: {0}")]
    Server(String),
}
