use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::Command;

use super::{DownloadReport, Downloader};
use crate::{Error, Res, config::AudioConfig};

/// Output file name template, relative to the destination directory.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Downloads and transcodes with the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    executable: PathBuf,
    audio: AudioConfig,
}

impl YtDlp {
    /// Locates `executable` (a bare name is searched on `PATH`).
    ///
    /// # Errors
    ///
    /// [`Error::MissingDependency`] when it cannot be found.
    pub fn new(executable: impl AsRef<Path>, audio: AudioConfig) -> Res<Self> {
        let executable = executable.as_ref();
        let resolved = which::which(executable).map_err(|source| Error::MissingDependency {
            binary: executable.display().to_string(),
            source,
        })?;
        Ok(Self::with_executable(resolved, audio))
    }

    /// Uses `executable` as given, without checking that it exists.
    pub fn with_executable(executable: PathBuf, audio: AudioConfig) -> Self {
        Self { executable, audio }
    }

    /// Command line arguments for a single location.
    pub fn args(&self, url: &str, dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--quiet",
            "--no-warnings",
            "--no-progress",
            "--no-playlist",
            "--format",
            "bestaudio/best",
            "--extract-audio",
            "--audio-format",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        args.push(self.audio.format.clone().into());
        args.push("--audio-quality".into());
        args.push(format!("{}K", self.audio.quality).into());
        args.push("--output".into());
        args.push(dest.join(OUTPUT_TEMPLATE).into_os_string());
        args.push(url.into());
        args
    }

    async fn download_one(&self, url: &str, dest: &Path) -> Result<(), String> {
        tracing::debug!(%url, executable = %self.executable.display(), "running yt-dlp");

        let output = Command::new(&self.executable)
            .args(self.args(url, dest))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {e}", self.executable.display()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(str::trim)
            .map(str::to_string)
            .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
        Err(reason)
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn download(&self, urls: &[String], dest: &Path) -> Res<DownloadReport> {
        let mut report = DownloadReport::default();
        if urls.is_empty() {
            return Ok(report);
        }

        async_fs::create_dir_all(dest).await?;

        let pb = ProgressBar::new(urls.len() as u64);
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.blue} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        for url in urls {
            pb.set_message(url.clone());
            match self.download_one(url, dest).await {
                Ok(()) => report.downloaded.push(url.clone()),
                Err(reason) => {
                    tracing::warn!(%url, "download failed: {reason}");
                    report.failed.push((url.clone(), reason));
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(report)
    }
}
