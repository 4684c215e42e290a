use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::{Res, resolver::SearchResolver};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""videoRenderer":\{"videoId":"([a-zA-Z0-9_-]{11})""#)
        .expect("video id pattern is valid")
});

/// Scrapes the YouTube results page for the top video.
///
/// One client is shared by every lookup of a run.
#[derive(Debug, Clone)]
pub struct YoutubeSearch {
    http: Client,
    base_url: String,
}

impl YoutubeSearch {
    pub fn new(base_url: impl Into<String>) -> Res<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{base}/results?search_query={query}",
            base = self.base_url,
            query = urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl SearchResolver for YoutubeSearch {
    async fn first_result(&self, query: &str) -> Res<Option<String>> {
        let html = self
            .http
            .get(self.search_url(query))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(extract_first_result(&html, &self.base_url))
    }
}

/// Finds the first video on a results page.
///
/// Rendered markup carries the result as a thumbnail anchor; the page as it
/// is served only has the embedded initial data, where the first
/// `videoRenderer` is the top organic result. Promoted renderers are skipped.
pub fn extract_first_result(html: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    if let Ok(selector) = Selector::parse("a#thumbnail[href], a.ytd-thumbnail[href]") {
        let href = document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.starts_with("/watch"));
        if let Some(href) = href {
            return Some(format!("{base_url}{href}"));
        }
    }

    VIDEO_ID
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|id| format!("{base_url}/watch?v={}", id.as_str()))
}
