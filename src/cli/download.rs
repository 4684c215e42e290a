use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Res,
    config::Config,
    download::YtDlp,
    error, info,
    management::TokenManager,
    pipeline::{self, RunRequest, RunSummary},
    resolver::RetryBudget,
    spotify::playlist::SpotifyPlaylist,
    success, utils, warning,
    youtube::YoutubeSearch,
};

/// Options of the `download` command; unset values are prompted for or taken
/// from the configuration.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub playlist: Option<String>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub quality: Option<u32>,
    pub shared_retry_budget: bool,
}

pub async fn download(opts: DownloadOptions) {
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };
    if let Some(format) = opts.format.clone() {
        config.audio.format = format;
    }
    if let Some(quality) = opts.quality {
        config.audio.quality = quality;
    }

    let request = match build_request(&opts) {
        Ok(r) => r,
        Err(e) => error!("{}", e),
    };

    match run(&config, &request).await {
        Ok(summary) => report(&summary),
        Err(e) => error!("{}", e),
    }
}

fn build_request(opts: &DownloadOptions) -> Res<RunRequest> {
    let playlist = match &opts.playlist {
        Some(p) => p.clone(),
        None => utils::prompt("Playlist URL: ")?,
    };
    let output_dir = match &opts.output {
        Some(o) => o.clone(),
        None => PathBuf::from(utils::prompt("Full path to save songs to: ")?),
    };

    Ok(RunRequest {
        playlist_id: utils::parse_playlist_id(&playlist)?,
        output_dir,
        retry_budget: if opts.shared_retry_budget {
            RetryBudget::PerKey
        } else {
            RetryBudget::PerEntry
        },
    })
}

async fn run(config: &Config, request: &RunRequest) -> Res<RunSummary> {
    // fail on a missing yt-dlp before any network work
    let downloader = YtDlp::new(&config.ytdlp_path, config.audio.clone())?;
    let tokens = TokenManager::load(config.spotify.clone()).await?;
    let lister = SpotifyPlaylist::new(&config.spotify.api_url, tokens)?;
    let search = YoutubeSearch::new(&config.youtube_url)?;

    info!("Downloading playlist {}", request.playlist_id);

    // redrawn by the resolver on every track
    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        progress.set_style(style);
    }

    let summary = pipeline::run(&lister, &search, &downloader, request, &progress).await;
    if summary.is_err() {
        progress.finish_and_clear();
    }
    summary
}

fn report(summary: &RunSummary) {
    for (url, reason) in &summary.download.failed {
        warning!("Failed to download {}: {}", url, reason);
    }

    success!(
        "Done! {} of {} tracks downloaded.",
        summary.download.downloaded.len(),
        summary.resolution.resolved.len() + summary.resolution.unresolved.len()
    );

    if !summary.resolution.unresolved.is_empty() {
        println!();
        warning!("Could not download following tracks:");
        for key in summary.resolution.unresolved_keys() {
            println!("{key}");
        }
    }
}
