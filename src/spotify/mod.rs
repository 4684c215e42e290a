//! # Spotify Integration Module
//!
//! The integration layer between playlistdl and the Spotify Web API. It covers
//! the two things the tool needs from Spotify: an OAuth token and the track
//! listing of a playlist.
//!
//! ## Architecture
//!
//! ```text
//! CLI / Pipeline
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (OAuth 2.0 PKCE)
//!     └── Playlist Tracks (paginated listing)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Modules
//!
//! [`auth`] - OAuth 2.0 PKCE flow: verifier and challenge generation, local
//! callback server, browser launch, code exchange and token refresh.
//!
//! [`playlist`] - Lists the tracks of a playlist as (artist, title) pairs,
//! following Spotify's `next` links until the playlist is exhausted. It is
//! the [`crate::pipeline::TrackLister`] used by the `download` command.
//!
//! ## Error Handling
//!
//! Requests go through a client with a fixed 10 second timeout. Rate limits
//! (`429`, honoring `Retry-After`) and server errors (`5xx`) are retried at
//! the transport level a bounded number of times. A `401` surfaces as
//! [`crate::Error::Auth`], a `404` as [`crate::Error::InvalidPlaylist`];
//! anything else is propagated as [`crate::Error::Http`].
//!
//! ## API Coverage
//!
//! - `GET /playlists/{playlist_id}/tracks` - Playlist items, paginated
//! - `POST /api/token` - Token exchange and refresh operations

pub mod auth;
pub mod playlist;
