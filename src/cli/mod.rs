//! # CLI Module
//!
//! The command-line layer of playlistdl. Each command loads the
//! configuration, calls into the library and turns fatal errors into the
//! red `!` console line plus exit code 1.
//!
//! ## Commands
//!
//! - [`auth`] - Runs the Spotify OAuth PKCE flow and caches the token
//! - [`download`] - Lists a playlist, resolves every track on YouTube and
//!   downloads the audio into a directory
//!
//! ## Usage Patterns
//!
//! ```bash
//! playlistdl auth
//! playlistdl download --playlist https://open.spotify.com/playlist/<id> --output ~/Music/mix
//! playlistdl download                      # prompts for playlist and directory
//! ```
//!
//! ## Output
//!
//! A single updating `Getting track URLs... N%` line while tracks are being
//! resolved, a progress bar while downloading, `Done!`, and finally the
//! `artist - title` lines of every track no video was found for.

mod auth;
mod download;

pub use auth::auth;
pub use download::DownloadOptions;
pub use download::download;
