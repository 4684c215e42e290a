//! One playlist run: list, resolve, download.
//!
//! The three stages run strictly one after the other. Each collaborator sits
//! behind a trait so the whole run can be driven headless, which is how the
//! CLI and the tests both use it.

use std::path::PathBuf;

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::{
    Res,
    download::{DownloadReport, Downloader},
    info,
    resolver::{self, Resolution, RetryBudget, SearchResolver},
    types::Track,
};

/// Lists the tracks of a playlist in playlist order.
#[async_trait]
pub trait TrackLister {
    async fn list_tracks(&self, playlist_id: &str) -> Res<Vec<Track>>;
}

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub playlist_id: String,
    pub output_dir: PathBuf,
    pub retry_budget: RetryBudget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub resolution: Resolution,
    pub download: DownloadReport,
}

/// Runs the playlist through all three stages.
///
/// A listing failure aborts the run before anything is searched or
/// downloaded. Otherwise the downloader is always invoked, with an empty list
/// when nothing resolved.
pub async fn run<L, S, D>(
    lister: &L,
    search: &S,
    downloader: &D,
    request: &RunRequest,
    progress: &ProgressBar,
) -> Res<RunSummary>
where
    L: TrackLister + ?Sized,
    S: SearchResolver + ?Sized,
    D: Downloader + ?Sized,
{
    let tracks = lister.list_tracks(&request.playlist_id).await?;
    tracing::info!(count = tracks.len(), playlist = %request.playlist_id, "listed playlist");

    let resolution = resolver::resolve(tracks, search, request.retry_budget, progress).await;
    progress.finish();

    info!("Downloading tracks...");
    let download = downloader
        .download(&resolution.urls(), &request.output_dir)
        .await?;

    Ok(RunSummary {
        resolution,
        download,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{Error, download::MockDownloader};

    struct StaticLister(Res<Vec<Track>>);

    #[async_trait]
    impl TrackLister for StaticLister {
        async fn list_tracks(&self, _playlist_id: &str) -> Res<Vec<Track>> {
            match &self.0 {
                Ok(tracks) => Ok(tracks.clone()),
                Err(e) => Err(Error::InvalidPlaylist(e.to_string())),
            }
        }
    }

    struct EchoSearch;

    #[async_trait]
    impl SearchResolver for EchoSearch {
        async fn first_result(&self, query: &str) -> Res<Option<String>> {
            Ok(Some(format!("https://video.test/{}", query.replace(' ', "+"))))
        }
    }

    fn request() -> RunRequest {
        RunRequest {
            playlist_id: "playlist".to_string(),
            output_dir: PathBuf::from("/music"),
            retry_budget: RetryBudget::default(),
        }
    }

    #[tokio::test]
    async fn downloader_receives_resolved_urls_and_destination() {
        let lister = StaticLister(Ok(vec![Track::new("A", "B"), Track::new("C", "D")]));
        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .withf(|urls: &[String], dest: &Path| {
                urls == ["https://video.test/A+B", "https://video.test/C+D"]
                    && dest == Path::new("/music")
            })
            .times(1)
            .returning(|urls, _| {
                Ok(DownloadReport {
                    downloaded: urls.to_vec(),
                    failed: Vec::new(),
                })
            });

        let summary = run(&lister, &EchoSearch, &downloader, &request(), &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(summary.download.downloaded.len(), 2);
    }

    #[tokio::test]
    async fn listing_failure_skips_download() {
        let lister = StaticLister(Err(Error::InvalidPlaylist("gone".to_string())));
        let mut downloader = MockDownloader::new();
        downloader.expect_download().times(0);

        let result = run(&lister, &EchoSearch, &downloader, &request(), &ProgressBar::hidden()).await;

        assert!(matches!(result, Err(Error::InvalidPlaylist(_))));
    }
}
