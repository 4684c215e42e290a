//! Track to video resolution with a single retry per track.
//!
//! Tracks are worked off a FIFO queue. A track whose lookup comes back empty
//! is pushed to the back of the queue once, so it is tried again after every
//! track that was pending at the time. A second miss makes it unresolved.
//!
//! The progress line is computed against the playlist length before retries
//! were queued, which makes it approximate. It only ever feeds the console.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::{
    Res,
    types::{ResolvedTrack, Track},
    utils,
};

/// Attempts a single track gets before it is given up on.
pub const MAX_ATTEMPTS: u32 = 2;

/// Looks up the location of the top search result for a query.
///
/// Implementations must not retry; retrying is the resolver's job.
#[async_trait]
pub trait SearchResolver {
    /// Returns `Ok(None)` when the result page has no usable result.
    async fn first_result(&self, query: &str) -> Res<Option<String>>;
}

/// Who shares a retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryBudget {
    /// Every queue entry carries its own attempt count, so repeated playlist
    /// entries are retried independently.
    #[default]
    PerEntry,
    /// Entries are bookkept by their `"artist - title"` key. Identical
    /// entries share one retry: once the key has been retried, any later miss
    /// under that key is final, even on an entry's first attempt.
    PerKey,
}

/// Outcome of resolving a whole playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Found locations in the order they were found.
    pub resolved: Vec<ResolvedTrack>,
    /// Tracks that ran out of attempts.
    pub unresolved: Vec<Track>,
    /// Number of search calls made.
    pub attempts: usize,
}

impl Resolution {
    pub fn urls(&self) -> Vec<String> {
        self.resolved.iter().map(|r| r.url.clone()).collect()
    }

    pub fn unresolved_keys(&self) -> Vec<String> {
        self.unresolved.iter().map(Track::key).collect()
    }
}

/// Resolves every track to at most one location.
///
/// Search errors count as misses; they are logged and never abort the batch.
pub async fn resolve<S>(
    tracks: Vec<Track>,
    search: &S,
    budget: RetryBudget,
    progress: &ProgressBar,
) -> Resolution
where
    S: SearchResolver + ?Sized,
{
    let original_count = tracks.len();
    let mut queue: VecDeque<(Track, u32)> = tracks.into_iter().map(|t| (t, 1)).collect();
    let mut retried_keys: HashSet<String> = HashSet::new();
    let mut resolution = Resolution::default();

    while let Some((track, attempt)) = queue.pop_front() {
        let percent = utils::progress_percent(resolution.attempts, original_count);
        progress.set_message(format!("Getting track URLs... {percent}%"));

        resolution.attempts += 1;
        let found = match search.first_result(&track.search_query()).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(track = %track, attempt, "search failed: {e}");
                None
            }
        };

        if let Some(url) = found {
            tracing::debug!(track = %track, attempt, %url, "resolved");
            resolution.resolved.push(ResolvedTrack { track, url });
            continue;
        }

        let retry = match budget {
            RetryBudget::PerEntry => attempt < MAX_ATTEMPTS,
            RetryBudget::PerKey => retried_keys.insert(track.key()),
        };

        if retry {
            tracing::debug!(track = %track, attempt, "no result, queued for retry");
            queue.push_back((track, attempt + 1));
        } else {
            tracing::debug!(track = %track, attempt, "no result, giving up");
            resolution.unresolved.push(track);
        }
    }

    progress.set_message("Getting track URLs... 100%");
    resolution
}
