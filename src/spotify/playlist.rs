use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response, StatusCode, header::RETRY_AFTER};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    Error, Res,
    management::TokenManager,
    pipeline::TrackLister,
    types::{PlaylistItem, PlaylistTracksResponse, Track},
};

/// Fixed timeout for every Spotify request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Transport retries on rate limiting and server errors.
const MAX_RETRIES: u32 = 10;
const PAGE_LIMIT: u32 = 100;
const ITEM_FIELDS: &str = "items(track(name,artists(name),album(artists(name)))),next";

/// Lists playlist tracks through the Spotify Web API.
pub struct SpotifyPlaylist {
    http: Client,
    api_url: String,
    tokens: Mutex<TokenManager>,
}

impl SpotifyPlaylist {
    pub fn new(api_url: impl Into<String>, tokens: TokenManager) -> Res<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            tokens: Mutex::new(tokens),
        })
    }

    /// Fetches every page of the playlist, in playlist order.
    ///
    /// # Errors
    ///
    /// - [`Error::Auth`] when Spotify rejects the token
    /// - [`Error::InvalidPlaylist`] when the playlist does not exist
    /// - [`Error::Http`] for anything else that still fails after retries
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Res<Vec<Track>> {
        let pb = ProgressBar::new_spinner();
        pb.set_message("Fetching playlist tracks...");
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        let result = self.fetch_all_pages(playlist_id).await;
        pb.finish_and_clear();
        result
    }

    async fn fetch_all_pages(&self, playlist_id: &str) -> Res<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut next = Some(self.first_page_url(playlist_id));

        while let Some(url) = next {
            let page: PlaylistTracksResponse = self.get(&url, playlist_id).await?.json().await?;
            tracks.extend(tracks_from_items(&page.items));
            next = page.next;
        }

        Ok(tracks)
    }

    fn first_page_url(&self, playlist_id: &str) -> String {
        format!(
            "{api}/playlists/{id}/tracks?fields={fields}&additional_types=track&limit={limit}",
            api = self.api_url,
            id = playlist_id,
            fields = urlencoding::encode(ITEM_FIELDS),
            limit = PAGE_LIMIT
        )
    }

    async fn get(&self, url: &str, playlist_id: &str) -> Res<Response> {
        let mut retries = 0;

        loop {
            let token = self.tokens.lock().await.get_valid_token().await?;
            let response = self.http.get(url).bearer_auth(token).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            match status {
                StatusCode::UNAUTHORIZED => {
                    return Err(Error::Auth(
                        "Spotify rejected the access token. Please run playlistdl auth".to_string(),
                    ));
                }
                StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                    return Err(Error::InvalidPlaylist(format!(
                        "playlist '{playlist_id}' not found ({status})"
                    )));
                }
                StatusCode::TOO_MANY_REQUESTS if retries < MAX_RETRIES => {
                    let wait = retry_after(&response).unwrap_or(Duration::from_secs(1));
                    tracing::warn!(retries, ?wait, "rate limited by Spotify");
                    sleep(wait).await;
                }
                s if s.is_server_error() && retries < MAX_RETRIES => {
                    let wait = Duration::from_secs(2u64.pow(retries.min(4)));
                    tracing::warn!(retries, %status, ?wait, "Spotify server error, retrying");
                    sleep(wait).await;
                }
                _ => return response.error_for_status().map_err(Error::from),
            }

            retries += 1;
        }
    }
}

#[async_trait]
impl TrackLister for SpotifyPlaylist {
    async fn list_tracks(&self, playlist_id: &str) -> Res<Vec<Track>> {
        self.get_playlist_tracks(playlist_id).await
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Maps playlist items to tracks.
///
/// The first track artist wins; tracks without artists fall back to the
/// first album artist. Removed entries and entries without any artist or
/// title are skipped.
pub fn tracks_from_items(items: &[PlaylistItem]) -> Vec<Track> {
    items
        .iter()
        .filter_map(|item| {
            let Some(track) = item.track.as_ref() else {
                tracing::debug!("skipping unavailable playlist entry");
                return None;
            };

            let title = track.name.as_deref().filter(|n| !n.is_empty())?;
            let artist = track
                .artists
                .iter()
                .chain(track.album.iter().flat_map(|a| a.artists.iter()))
                .find_map(|a| a.name.as_deref().filter(|n| !n.is_empty()));

            match artist {
                Some(artist) => Some(Track::new(artist, title)),
                None => {
                    tracing::debug!(title, "skipping playlist entry without artist");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    };

    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::{HeaderMap, header},
        response::{IntoResponse, Response as ServerResponse},
        routing::get,
    };
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        config::{self, SpotifyConfig},
        types::Token,
    };

    /// Local stand-in for the playlist items endpoint.
    ///
    /// `paged` is rate limited once, `flaky` is unavailable once, both then
    /// serve two pages linked by `next`.
    struct FakeSpotify {
        base: String,
        rate_limited: AtomicBool,
        unavailable: AtomicBool,
        hits: AtomicUsize,
    }

    fn item(artist: &str, title: &str) -> Value {
        json!({"track": {"name": title, "artists": [{"name": artist}]}})
    }

    async fn playlist_tracks(
        State(fake): State<Arc<FakeSpotify>>,
        Path(id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> ServerResponse {
        fake.hits.fetch_add(1, Ordering::SeqCst);

        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if bearer != Some("Bearer access") || id == "unauth" {
            return StatusCode::UNAUTHORIZED.into_response();
        }

        match id.as_str() {
            "missing" => StatusCode::NOT_FOUND.into_response(),
            "forbidden" => StatusCode::FORBIDDEN.into_response(),
            "paged" if fake.rate_limited.swap(false, Ordering::SeqCst) => {
                (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "0")]).into_response()
            }
            "flaky" if fake.unavailable.swap(false, Ordering::SeqCst) => {
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            }
            _ if query.contains_key("offset") => {
                Json(json!({"items": [item("A2", "T2")], "next": null})).into_response()
            }
            _ if query.get("limit").map(String::as_str) != Some("100") => {
                StatusCode::BAD_REQUEST.into_response()
            }
            _ => Json(json!({
                "items": [item("A1", "T1"), {"track": null}],
                "next": format!("{}/playlists/{id}/tracks?offset=100", fake.base)
            }))
            .into_response(),
        }
    }

    async fn fake_spotify() -> Arc<FakeSpotify> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let fake = Arc::new(FakeSpotify {
            base: format!("http://{}", listener.local_addr().unwrap()),
            rate_limited: AtomicBool::new(true),
            unavailable: AtomicBool::new(true),
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/playlists/{id}/tracks", get(playlist_tracks))
            .with_state(fake.clone());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        fake
    }

    fn lister(fake: &FakeSpotify) -> SpotifyPlaylist {
        let config = SpotifyConfig {
            client_id: "client".to_string(),
            redirect_uri: config::DEFAULT_REDIRECT_URI.to_string(),
            scope: config::DEFAULT_SCOPE.to_string(),
            auth_url: config::DEFAULT_AUTH_URL.to_string(),
            token_url: config::DEFAULT_TOKEN_URL.to_string(),
            api_url: fake.base.clone(),
        };
        let token = Token {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            scope: String::new(),
            expires_in: 3600,
            obtained_at: Utc::now().timestamp() as u64,
        };
        SpotifyPlaylist::new(&fake.base, TokenManager::new(token, config)).unwrap()
    }

    #[tokio::test]
    async fn follows_next_after_rate_limit() {
        let fake = fake_spotify().await;

        let tracks = lister(&fake).list_tracks("paged").await.unwrap();

        assert_eq!(tracks, vec![Track::new("A1", "T1"), Track::new("A2", "T2")]);
        // 429, first page, second page
        assert_eq!(fake.hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let fake = fake_spotify().await;

        let tracks = lister(&fake).list_tracks("flaky").await.unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(fake.hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejected_token_is_an_auth_error() {
        let fake = fake_spotify().await;

        let result = lister(&fake).list_tracks("unauth").await;

        assert!(matches!(result, Err(Error::Auth(_))));
        assert_eq!(fake.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_playlist_is_invalid() {
        let fake = fake_spotify().await;

        let result = lister(&fake).list_tracks("missing").await;

        assert!(matches!(result, Err(Error::InvalidPlaylist(_))));
        assert_eq!(fake.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_client_errors_are_not_retried() {
        let fake = fake_spotify().await;

        let result = lister(&fake).list_tracks("forbidden").await;

        assert!(matches!(result, Err(Error::Http(_))));
        assert_eq!(fake.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn maps_items_in_order_using_first_artist() {
        let page: PlaylistTracksResponse = serde_json::from_str(
            r#"{
                "items": [
                    {"track": {"name": "Under Pressure", "artists": [{"name": "Queen"}, {"name": "David Bowie"}], "album": {"artists": [{"name": "Queen"}]}}},
                    {"track": null},
                    {"track": {"name": "Intro", "artists": [], "album": {"artists": [{"name": "The xx"}]}}},
                    {"track": {"name": "Nameless", "artists": [{"name": null}]}},
                    {"track": {"name": "Hurt", "artists": [{"name": "Johnny Cash"}]}}
                ],
                "next": "https://api.spotify.com/v1/playlists/x/tracks?offset=100"
            }"#,
        )
        .unwrap();

        assert_eq!(
            tracks_from_items(&page.items),
            vec![
                Track::new("Queen", "Under Pressure"),
                Track::new("The xx", "Intro"),
                Track::new("Johnny Cash", "Hurt"),
            ]
        );
        assert!(page.next.is_some());
    }

    #[test]
    fn last_page_has_no_next() {
        let page: PlaylistTracksResponse =
            serde_json::from_str(r#"{"items": [], "next": null}"#).unwrap();
        assert!(page.next.is_none());
        assert!(tracks_from_items(&page.items).is_empty());
    }
}
