//! Spotify Playlist Downloader Library
//!
//! This library turns a Spotify playlist into a folder of audio files. It
//! reads the playlist's tracks from the Spotify Web API, looks up a matching
//! YouTube video for every track and hands the resolved videos to `yt-dlp`,
//! which downloads and transcodes the audio.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `download` - Batch downloader backed by `yt-dlp`
//! - `errors` - The crate-wide error type
//! - `management` - Token cache management
//! - `pipeline` - The list, resolve, download run
//! - `resolver` - Retrying track to video resolution
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//! - `youtube` - YouTube search scraping
//!
//! # Example
//!
//! ```
//! use playlistdl::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> playlistdl::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod errors;
pub mod management;
pub mod pipeline;
pub mod resolver;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;
pub mod youtube;

pub use errors::Error;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate returns this alias so errors can be
/// propagated with `?` up to the CLI layer, which decides whether they are
/// fatal.
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching playlist {}", playlist_id);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Done!");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1 right after printing, so it is
/// only used for fatal errors at the CLI layer.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues the user should notice, such as a single
/// track that failed to download.
///
/// # Example
///
/// ```
/// warning!("Failed to download {}: {}", url, reason);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
