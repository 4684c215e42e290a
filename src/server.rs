use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{Error, Res, api, config::SpotifyConfig, types::PkceToken};

/// Binds the callback listener so address problems surface before the
/// browser is opened.
pub async fn bind(addr: &str) -> Res<TcpListener> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("invalid SERVER_ADDRESS '{addr}': {e}")))?;
    Ok(TcpListener::bind(&addr).await?)
}

pub fn router(state: Arc<Mutex<Option<PkceToken>>>, config: SpotifyConfig) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(Extension(config))
}

pub async fn serve(
    listener: TcpListener,
    state: Arc<Mutex<Option<PkceToken>>>,
    config: SpotifyConfig,
) -> Res<()> {
    axum::serve(listener, router(state, config))
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use serde_json::Value;

    fn spotify_config() -> SpotifyConfig {
        SpotifyConfig {
            client_id: "client".to_string(),
            redirect_uri: config::DEFAULT_REDIRECT_URI.to_string(),
            scope: config::DEFAULT_SCOPE.to_string(),
            auth_url: config::DEFAULT_AUTH_URL.to_string(),
            token_url: config::DEFAULT_TOKEN_URL.to_string(),
            api_url: config::DEFAULT_API_URL.to_string(),
        }
    }

    #[tokio::test]
    async fn serves_health_endpoint() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(None));
        let server = tokio::spawn(serve(listener, state, spotify_config()));

        let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], env!("CARGO_PKG_NAME"));

        server.abort();
    }

    #[tokio::test]
    async fn callback_without_code_is_rejected() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(None));
        let server = tokio::spawn(serve(listener, state.clone(), spotify_config()));

        let body = reqwest::get(format!("http://{addr}/callback"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("Missing authorization code"));
        assert!(state.lock().await.is_none());

        server.abort();
    }

    #[tokio::test]
    async fn rejects_malformed_address() {
        assert!(matches!(bind("not-an-address").await, Err(Error::Config(_))));
    }
}
