//! # API Module
//!
//! HTTP endpoints served by the short-lived local server that receives the
//! Spotify OAuth redirect during `playlistdl auth`.
//!
//! ## Endpoints
//!
//! - [`callback`] - Completes the PKCE flow by exchanging the authorization
//!   code for a token and storing it in the shared state the auth flow polls.
//! - [`health`] - Returns status and version, handy to check that the
//!   configured `SERVER_ADDRESS` is reachable.
//!
//! ## Related Modules
//!
//! - [`crate::server`] - Router and listener setup
//! - [`crate::spotify::auth`] - The flow driving this server

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
