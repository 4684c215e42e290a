use std::path::PathBuf;

use chrono::Utc;

use crate::{
    Error, Res,
    config::{self, SpotifyConfig},
    spotify,
    types::Token,
};

/// Seconds before expiry at which a token is treated as expired.
const EXPIRY_MARGIN: u64 = 240;

/// Owns the cached OAuth token and keeps it fresh.
pub struct TokenManager {
    token: Token,
    config: SpotifyConfig,
}

impl TokenManager {
    pub fn new(token: Token, config: SpotifyConfig) -> Self {
        TokenManager { token, config }
    }

    /// Loads the token written by `playlistdl auth`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when no token has been cached yet, since
    /// without one nothing can be listed.
    pub async fn load(config: SpotifyConfig) -> Res<Self> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path).await.map_err(|e| {
            Error::Auth(format!(
                "no cached token at {} ({e}). Please run playlistdl auth",
                path.display()
            ))
        })?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(Self { token, config })
    }

    pub async fn persist(&self) -> Res<()> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.token)?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    /// Returns an access token, refreshing and re-persisting it first when it
    /// is about to expire.
    pub async fn get_valid_token(&mut self) -> Res<String> {
        if self.is_expired() {
            let mut new_token =
                spotify::auth::refresh_token(&self.config, &self.token.refresh_token).await?;
            // Spotify only sometimes rotates the refresh token
            if new_token.refresh_token.is_empty() {
                new_token.refresh_token = self.token.refresh_token.clone();
            }
            self.token = new_token;
            if let Err(e) = self.persist().await {
                tracing::warn!("failed to persist refreshed token: {e}");
            }
        }

        Ok(self.token.access_token.clone())
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN >= self.token.obtained_at + self.token.expires_in
    }

    fn token_path() -> PathBuf {
        config::data_dir().join("cache/token.json")
    }
}
