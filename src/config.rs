//! Configuration management for playlistdl.
//!
//! Configuration values come from environment variables and an optional
//! `.env` file. The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)
//!
//! Only the Spotify client ID has no default; everything else points at the
//! public Spotify and YouTube endpoints and a `yt-dlp` on `PATH`.

use std::{env, path::PathBuf};

use crate::{Error, Res};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SCOPE: &str = "playlist-read-private playlist-read-collaborative";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_YOUTUBE_URL: &str = "https://www.youtube.com";
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";
pub const DEFAULT_AUDIO_QUALITY: u32 = 192;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives under `playlistdl/.env` in the platform-specific local data
/// directory:
/// - Linux: `~/.local/share/playlistdl/.env`
/// - macOS: `~/Library/Application Support/playlistdl/.env`
/// - Windows: `%LOCALAPPDATA%/playlistdl/.env`
///
/// The directory is created when missing. A missing `.env` file is fine,
/// the variables may be set in the environment directly.
///
/// # Errors
///
/// Fails when the directory cannot be created or the file exists but cannot
/// be parsed.
pub async fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    }
    Ok(())
}

/// Returns the directory playlistdl keeps its `.env` and cache files in.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("playlistdl");
    path
}

/// Spotify Web API and OAuth settings.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
}

/// Audio output settings handed to the downloader.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub format: String,
    /// Target bitrate in kbit/s.
    pub quality: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyConfig,
    /// Address the OAuth callback server binds to.
    pub server_addr: String,
    pub youtube_url: String,
    pub ytdlp_path: PathBuf,
    pub audio: AudioConfig,
}

impl Config {
    /// Builds the configuration from the current environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `SPOTIFY_API_AUTH_CLIENT_ID` is not set
    /// or `AUDIO_QUALITY` is not a number.
    pub fn from_env() -> Res<Self> {
        let client_id = env::var("SPOTIFY_API_AUTH_CLIENT_ID")
            .ok()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string()))?;

        let quality = match env::var("AUDIO_QUALITY") {
            Ok(q) => q
                .trim()
                .parse::<u32>()
                .map_err(|e| Error::Config(format!("AUDIO_QUALITY is not a number: {e}")))?,
            Err(_) => DEFAULT_AUDIO_QUALITY,
        };

        Ok(Self {
            spotify: SpotifyConfig {
                client_id,
                redirect_uri: var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
                scope: var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
                auth_url: var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
                token_url: var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
                api_url: trim_slash(var_or("SPOTIFY_API_URL", DEFAULT_API_URL)),
            },
            server_addr: var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            youtube_url: trim_slash(var_or("YOUTUBE_URL", DEFAULT_YOUTUBE_URL)),
            ytdlp_path: PathBuf::from(var_or("YTDLP_PATH", DEFAULT_YTDLP_PATH)),
            audio: AudioConfig {
                format: var_or("AUDIO_FORMAT", DEFAULT_AUDIO_FORMAT),
                quality,
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
