use std::time::{Duration, Instant};

use chrono::Utc;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser::{self, ParseFeedError};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::models::{Article, Friend};
use crate::sanitize::extract_clean_html;
use crate::timezone::TimeNormalizer;
use crate::truncate::safe_truncate;

pub const USER_AGENT: &str = "FcircleBot/1.0 (+https://github.com/TXM983/Fcircle)";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("no response headers within {0:?}")]
    HeaderTimeout(Duration),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("failed to parse feed: {0}")]
    Parse(#[from] ParseFeedError),
}

impl FetchError {
    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(e) => !e.is_builder(),
            FetchError::HeaderTimeout(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Whole request, body included
    pub timeout: Duration,
    /// Until the response head arrives
    pub header_timeout: Duration,
    /// TCP connect plus TLS handshake
    pub handshake_timeout: Duration,
    /// Extra attempts after the first one
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Max chars of sanitized content kept per article
    pub content_limit: usize,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            header_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_delay: Duration::from_secs(2),
            content_limit: 250,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Anything that can turn a friend into a batch of articles.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch_articles(
        &self,
        friend: &Friend,
        max_count: usize,
    ) -> Result<Vec<Article>, FetchError>;
}

pub struct Fetcher {
    client: Client,
    options: FetchOptions,
    time: TimeNormalizer,
}

impl Fetcher {
    pub fn new(options: FetchOptions, time: TimeNormalizer) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.handshake_timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            options,
            time,
        })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch a friend's feed and map its first `max_count` entries.
    pub async fn fetch_friend_articles(
        &self,
        friend: &Friend,
        max_count: usize,
    ) -> Result<Vec<Article>, FetchError> {
        let start = Instant::now();
        let result = self.fetch_feed(&friend.rss).await;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let feed = match result {
            Ok(feed) => {
                info!(
                    friend = %friend.name,
                    elapsed_ms,
                    "Fetched feed {}",
                    friend.rss
                );
                feed
            }
            Err(e) => {
                warn!(
                    friend = %friend.name,
                    elapsed_ms,
                    "Failed to fetch feed {}: {}",
                    friend.rss,
                    e
                );
                return Err(e);
            }
        };

        let articles = feed
            .entries
            .iter()
            .take(max_count)
            .map(|entry| {
                Self::entry_to_article(entry, friend, &self.time, self.options.content_limit)
            })
            .collect();

        Ok(articles)
    }

    async fn fetch_feed(&self, url: &str) -> Result<Feed, FetchError> {
        let response = self.send_with_retry(url).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await.map_err(FetchError::Body)?;
        let feed = parser::parse(&bytes[..])?;
        Ok(feed)
    }

    async fn send_with_retry(&self, url: &str) -> Result<Response, FetchError> {
        let mut attempt = 0;
        loop {
            match self.send_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.options.max_retries => {
                    attempt += 1;
                    debug!(
                        "Attempt {} for {} failed: {}; retrying in {:?}",
                        attempt, url, e, self.options.retry_delay
                    );
                    sleep(self.options.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, url: &str) -> Result<Response, FetchError> {
        // send() resolves once the status line and headers are in
        match timeout(self.options.header_timeout, self.client.get(url).send()).await {
            Ok(result) => result.map_err(FetchError::Transport),
            Err(_) => Err(FetchError::HeaderTimeout(self.options.header_timeout)),
        }
    }

    pub fn entry_to_article(
        entry: &Entry,
        friend: &Friend,
        time: &TimeNormalizer,
        content_limit: usize,
    ) -> Article {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default();

        let published = entry
            .published
            .or(entry.updated)
            .unwrap_or_else(Utc::now);

        let author = entry
            .authors
            .iter()
            .map(|person| person.name.trim())
            .find(|name| !name.is_empty())
            .unwrap_or(friend.name.as_str())
            .to_string();

        let content = safe_truncate(
            &extract_clean_html(Self::raw_content(entry)),
            content_limit,
        );

        Article {
            title,
            link: Self::entry_link(entry),
            published: time.format(published),
            author,
            avatar: friend.avatar.clone(),
            content,
            url: friend.url.clone(),
        }
    }

    /// Full content when present, otherwise the summary/description.
    pub fn raw_content(entry: &Entry) -> &str {
        let body = entry
            .content
            .as_ref()
            .and_then(|c| c.body.as_deref())
            .filter(|body| !body.is_empty());

        let summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.as_str())
            .filter(|summary| !summary.is_empty());

        body.or(summary).unwrap_or("")
    }

    /// Prefer the alternate (or rel-less) link, as RSS `<link>` and Atom
    /// `rel="alternate"` both point at the post itself.
    pub fn entry_link(entry: &Entry) -> String {
        entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone())
            .unwrap_or_default()
    }
}

impl FeedSource for Fetcher {
    async fn fetch_articles(
        &self,
        friend: &Friend,
        max_count: usize,
    ) -> Result<Vec<Article>, FetchError> {
        self.fetch_friend_articles(friend, max_count).await
    }
}
