use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use indicatif::ProgressBar;
use pretty_assertions::assert_eq;

use playlistdl::{
    Error, Res,
    download::{DownloadReport, Downloader},
    pipeline::{RunRequest, TrackLister, run},
    resolver::{RetryBudget, SearchResolver},
    types::Track,
};

struct FakeLister {
    tracks: Vec<Track>,
    fail: bool,
}

#[async_trait]
impl TrackLister for FakeLister {
    async fn list_tracks(&self, playlist_id: &str) -> Res<Vec<Track>> {
        if self.fail {
            return Err(Error::Auth(format!("token rejected for {playlist_id}")));
        }
        Ok(self.tracks.clone())
    }
}

/// Finds every query except the ones listed as missing.
struct FakeSearch {
    missing: Vec<&'static str>,
}

#[async_trait]
impl SearchResolver for FakeSearch {
    async fn first_result(&self, query: &str) -> Res<Option<String>> {
        if self.missing.iter().any(|m| *m == query) {
            return Ok(None);
        }
        Ok(Some(format!("https://www.youtube.com/watch?q={}", query.replace(' ', "_"))))
    }
}

#[derive(Default)]
struct RecordingDownloader {
    calls: Mutex<Vec<(Vec<String>, PathBuf)>>,
}

#[async_trait]
impl Downloader for RecordingDownloader {
    async fn download(&self, urls: &[String], dest: &Path) -> Res<DownloadReport> {
        self.calls
            .lock()
            .unwrap()
            .push((urls.to_vec(), dest.to_path_buf()));
        Ok(DownloadReport {
            downloaded: urls.to_vec(),
            failed: Vec::new(),
        })
    }
}

impl RecordingDownloader {
    fn calls(&self) -> Vec<(Vec<String>, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

fn request() -> RunRequest {
    RunRequest {
        playlist_id: "37i9dQZF1DXcBWIGoYBM5M".to_string(),
        output_dir: PathBuf::from("/tmp/playlistdl-test"),
        retry_budget: RetryBudget::PerEntry,
    }
}

#[tokio::test]
async fn three_tracks_all_resolve() {
    let lister = FakeLister {
        tracks: vec![
            Track::new("Queen", "Bohemian Rhapsody"),
            Track::new("Toto", "Africa"),
            Track::new("a-ha", "Take On Me"),
        ],
        fail: false,
    };
    let search = FakeSearch { missing: vec![] };
    let downloader = RecordingDownloader::default();

    let summary = run(&lister, &search, &downloader, &request(), &ProgressBar::hidden())
        .await
        .unwrap();

    let expected = vec![
        "https://www.youtube.com/watch?q=Queen_Bohemian_Rhapsody".to_string(),
        "https://www.youtube.com/watch?q=Toto_Africa".to_string(),
        "https://www.youtube.com/watch?q=a-ha_Take_On_Me".to_string(),
    ];
    assert_eq!(summary.resolution.urls(), expected);
    assert!(summary.resolution.unresolved.is_empty());
    assert_eq!(
        downloader.calls(),
        vec![(expected.clone(), PathBuf::from("/tmp/playlistdl-test"))]
    );
    assert_eq!(summary.download.downloaded, expected);
}

#[tokio::test]
async fn single_track_failing_twice() {
    let lister = FakeLister {
        tracks: vec![Track::new("Artist", "Title")],
        fail: false,
    };
    let search = FakeSearch {
        missing: vec!["Artist Title"],
    };
    let downloader = RecordingDownloader::default();

    let summary = run(&lister, &search, &downloader, &request(), &ProgressBar::hidden())
        .await
        .unwrap();

    assert!(summary.resolution.resolved.is_empty());
    assert_eq!(summary.resolution.unresolved_keys(), vec!["Artist - Title"]);
    assert_eq!(summary.resolution.attempts, 2);
    // the downloader still runs, with nothing to do
    assert_eq!(
        downloader.calls(),
        vec![(Vec::new(), PathBuf::from("/tmp/playlistdl-test"))]
    );
}

#[tokio::test]
async fn empty_playlist() {
    let lister = FakeLister {
        tracks: Vec::new(),
        fail: false,
    };
    let search = FakeSearch { missing: vec![] };
    let downloader = RecordingDownloader::default();

    let summary = run(&lister, &search, &downloader, &request(), &ProgressBar::hidden())
        .await
        .unwrap();

    assert!(summary.resolution.resolved.is_empty());
    assert!(summary.resolution.unresolved.is_empty());
    assert_eq!(downloader.calls().len(), 1);
    assert!(downloader.calls()[0].0.is_empty());
}

#[tokio::test]
async fn lister_failure_is_fatal() {
    let lister = FakeLister {
        tracks: vec![Track::new("Artist", "Title")],
        fail: true,
    };
    let search = FakeSearch { missing: vec![] };
    let downloader = RecordingDownloader::default();

    let result = run(&lister, &search, &downloader, &request(), &ProgressBar::hidden()).await;

    assert!(matches!(result, Err(Error::Auth(_))));
    assert!(downloader.calls().is_empty());
}

#[tokio::test]
async fn partial_resolution_downloads_what_was_found() {
    let lister = FakeLister {
        tracks: vec![Track::new("A", "1"), Track::new("B", "2")],
        fail: false,
    };
    let search = FakeSearch {
        missing: vec!["A 1"],
    };
    let downloader = RecordingDownloader::default();

    let summary = run(&lister, &search, &downloader, &request(), &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(
        downloader.calls()[0].0,
        vec!["https://www.youtube.com/watch?q=B_2".to_string()]
    );
    assert_eq!(summary.resolution.unresolved_keys(), vec!["A - 1"]);
}
