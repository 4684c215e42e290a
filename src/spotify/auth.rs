use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    Error, Res,
    config::{Config, SpotifyConfig},
    management::TokenManager,
    server, success,
    types::{PkceToken, Token},
    utils, warning,
};

/// How long the flow waits for the browser to hit the callback.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl From<TokenResponse> for Token {
    fn from(res: TokenResponse) -> Self {
        Token {
            access_token: res.access_token,
            refresh_token: res.refresh_token.unwrap_or_default(),
            scope: res.scope.unwrap_or_default(),
            expires_in: res.expires_in,
            obtained_at: Utc::now().timestamp() as u64,
        }
    }
}

/// Runs the complete OAuth 2.0 PKCE authentication flow with Spotify.
///
/// 1. **PKCE Setup**: Generates a code verifier and its SHA256 challenge
/// 2. **Server Start**: Binds the local callback server
/// 3. **Browser Launch**: Opens the Spotify authorization URL
/// 4. **Callback Handling**: The server exchanges the returned code
/// 5. **Token Persistence**: The token is cached for later runs
///
/// When the browser cannot be opened the URL is printed so the user can
/// navigate to it manually.
///
/// # Errors
///
/// Fails when the callback server cannot bind, when no token arrives within
/// 60 seconds, or when the token cannot be written to the cache.
pub async fn auth(config: &Config, shared_state: Arc<Mutex<Option<PkceToken>>>) -> Res<()> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    // Store verifier in shared state before redirect
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let listener = server::bind(&config.server_addr).await?;
    let server_state = Arc::clone(&shared_state);
    let server_config = config.spotify.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, server_state, server_config).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = authorize_url(&config.spotify, &code_challenge);

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state).await;
    server_handle.abort();

    match token {
        Some(t) => {
            TokenManager::new(t, config.spotify.clone()).persist().await?;
            success!("Authentication successful!");
            Ok(())
        }
        None => Err(Error::Auth(
            "authentication failed or timed out".to_string(),
        )),
    }
}

/// Builds the authorization URL the user is sent to.
pub fn authorize_url(config: &SpotifyConfig, code_challenge: &str) -> String {
    format!(
        "{auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&code_challenge={code_challenge}&code_challenge_method=S256&scope={scope}",
        auth_url = config.auth_url,
        client_id = urlencoding::encode(&config.client_id),
        redirect_uri = urlencoding::encode(&config.redirect_uri),
        code_challenge = code_challenge,
        scope = urlencoding::encode(&config.scope),
    )
}

/// Polls the shared state until the callback handler stored a token.
///
/// Gives up after 60 seconds, checking once per second.
async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < CALLBACK_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|pkce| pkce.token.as_ref()) {
            return Some(token.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges a refresh token for a new access token.
///
/// The returned token's `refresh_token` is empty when Spotify did not rotate
/// it; [`TokenManager`] keeps the previous one in that case.
pub async fn refresh_token(config: &SpotifyConfig, refresh_token: &str) -> Res<Token> {
    let client = Client::new();
    let res = client
        .post(&config.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &config.client_id),
        ])
        .send()
        .await?;

    if !res.status().is_success() {
        return Err(Error::Auth(format!(
            "token refresh was rejected with {}. Please run playlistdl auth",
            res.status()
        )));
    }

    let json: TokenResponse = res.json().await?;
    Ok(json.into())
}

/// Exchanges an authorization code for an access token using PKCE.
///
/// `verifier` must be the code verifier whose challenge was sent with the
/// authorization request.
pub async fn exchange_code_pkce(config: &SpotifyConfig, code: &str, verifier: &str) -> Res<Token> {
    let client = Client::new();
    let res = client
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let json: TokenResponse = res.json().await?;
    Ok(json.into())
}
