//! Batch download and transcode of resolved videos.
//!
//! The [`Downloader`] receives the complete list of resolved locations plus
//! the destination directory and writes one audio file per location. The
//! shipped implementation is [`YtDlp`], which shells out to `yt-dlp` (and,
//! through it, `ffmpeg`) once per location.

mod ytdlp;

use std::path::Path;

use async_trait::async_trait;

use crate::Res;

pub use ytdlp::YtDlp;

/// What happened to each location handed to a [`Downloader`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: Vec<String>,
    /// `(location, reason)` for every item that did not produce a file.
    pub failed: Vec<(String, String)>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader {
    /// Downloads every location into `dest`.
    ///
    /// Individual failures end up in [`DownloadReport::failed`]; an `Err` is
    /// reserved for problems that affect the whole batch, like an unwritable
    /// destination.
    async fn download(&self, urls: &[String], dest: &Path) -> Res<DownloadReport>;
}
