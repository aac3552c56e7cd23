use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregator::CrawlOptions;
use crate::fetcher::{FetchOptions, USER_AGENT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Where the JSON friend list lives
    pub friends_url: String,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// IANA zone used to render publish times
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/feed_result.json")
}

fn default_timezone() -> String {
    "Asia/Shanghai".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CrawlConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_articles_per_friend")]
    pub max_articles_per_friend: usize,
    /// Max chars of sanitized content per article
    #[serde(default = "default_content_limit")]
    pub content_limit: usize,
}

fn default_max_concurrency() -> usize {
    10
}

fn default_max_articles_per_friend() -> usize {
    10
}

fn default_content_limit() -> usize {
    250
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            max_articles_per_friend: default_max_articles_per_friend(),
            content_limit: default_content_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_header_timeout_secs")]
    pub header_timeout_secs: u64,
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_header_timeout_secs() -> u64 {
    5
}

fn default_handshake_timeout_secs() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            header_timeout_secs: default_header_timeout_secs(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.http.timeout_secs),
            header_timeout: Duration::from_secs(self.http.header_timeout_secs),
            handshake_timeout: Duration::from_secs(self.http.handshake_timeout_secs),
            max_retries: self.http.max_retries,
            retry_delay: Duration::from_secs(self.http.retry_delay_secs),
            content_limit: self.crawl.content_limit,
            user_agent: self.http.user_agent.clone(),
        }
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            max_concurrency: self.crawl.max_concurrency,
            max_articles_per_friend: self.crawl.max_articles_per_friend,
        }
    }
}
