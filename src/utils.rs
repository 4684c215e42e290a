use std::io::{self, BufRead, Write};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use url::Url;

use crate::{Error, Res};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Extracts the playlist id from a playlist URL, a `spotify:playlist:` URI or
/// a bare id.
///
/// ```text
/// https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc -> 37i9dQZF1DXcBWIGoYBM5M
/// spotify:playlist:37i9dQZF1DXcBWIGoYBM5M                         -> 37i9dQZF1DXcBWIGoYBM5M
/// 37i9dQZF1DXcBWIGoYBM5M                                          -> 37i9dQZF1DXcBWIGoYBM5M
/// ```
pub fn parse_playlist_id(input: &str) -> Res<String> {
    let input = input.trim();
    let invalid = || Error::InvalidPlaylist(format!("cannot read a playlist id from '{input}'"));

    if let Some(id) = input.strip_prefix("spotify:playlist:") {
        return is_valid_id(id).then(|| id.to_string()).ok_or_else(invalid);
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).map_err(|_| invalid())?;
        if !url.host_str().is_some_and(|h| h.ends_with("spotify.com")) {
            return Err(invalid());
        }
        // open.spotify.com/playlist/<id> and open.spotify.com/intl-de/playlist/<id>
        let mut segments = url.path_segments().ok_or_else(invalid)?;
        segments.find(|s| *s == "playlist").ok_or_else(invalid)?;
        let id = segments.next().ok_or_else(invalid)?;
        return is_valid_id(id).then(|| id.to_string()).ok_or_else(invalid);
    }

    is_valid_id(input)
        .then(|| input.to_string())
        .ok_or_else(invalid)
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Share of `done` against `total` in whole percent, clamped to 100.
///
/// `total` is the playlist length before any retries were queued, so `done`
/// can exceed it. An empty playlist counts as finished.
pub fn progress_percent(done: usize, total: usize) -> u64 {
    if total == 0 {
        return 100;
    }
    ((done as u64 * 100) / total as u64).min(100)
}

/// Asks for a line on stdin, re-prompting while the answer is blank.
pub fn prompt(label: &str) -> Res<String> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "{label}")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(Error::Config(format!("no input for '{}'", label.trim())));
        }
        let answer = line.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}
