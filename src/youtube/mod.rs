//! YouTube lookups.
//!
//! [`search::YoutubeSearch`] is the [`crate::resolver::SearchResolver`] used by
//! the `download` command. It does not retry; a miss is handed back to the
//! resolver, which decides whether the track gets another go.

pub mod search;

pub use search::YoutubeSearch;
