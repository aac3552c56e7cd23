use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use url::Url;

use crate::fetcher::FeedSource;
use crate::models::{Article, FeedResult, Friend, SimpleArticle};
use crate::timezone::TimeNormalizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Fetches allowed in flight at once
    pub max_concurrency: usize,
    pub max_articles_per_friend: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            max_articles_per_friend: 10,
        }
    }
}

/// Crawls every friend, then merges, orders and groups their articles.
pub struct Aggregator<S> {
    source: S,
    options: CrawlOptions,
    time: TimeNormalizer,
}

impl<S: FeedSource> Aggregator<S> {
    pub fn new(source: S, options: CrawlOptions, time: TimeNormalizer) -> Self {
        Self {
            source,
            options,
            time,
        }
    }

    #[cfg(test)]
    fn source(&self) -> &S {
        &self.source
    }

    /// Run the full crawl. Friends that fail to fetch are logged and skipped,
    /// so this always yields a (possibly empty) result.
    pub async fn crawl(&self, friends: &[Friend]) -> FeedResult {
        let articles = self.fetch_all(friends).await;
        let sorted = sort_articles(articles, &self.time);
        let result = group_by_domain(&sorted);

        info!(
            "Crawl complete: {} articles from {} sources",
            result.values().map(Vec::len).sum::<usize>(),
            result.len()
        );
        result
    }

    /// Fetch all friends with at most `max_concurrency` in flight.
    ///
    /// Each fetch hands back its own batch; batches are concatenated in
    /// completion order once every fetch has finished.
    pub async fn fetch_all(&self, friends: &[Friend]) -> Vec<Article> {
        let max_articles = self.options.max_articles_per_friend;

        let batches: Vec<Vec<Article>> = stream::iter(friends)
            .map(|friend| async move {
                match self.source.fetch_articles(friend, max_articles).await {
                    Ok(articles) => {
                        info!("Fetched {} articles from '{}'", articles.len(), friend.name);
                        articles
                    }
                    Err(e) => {
                        warn!("Skipping '{}': {}", friend.name, e);
                        Vec::new()
                    }
                }
            })
            .buffer_unordered(self.options.max_concurrency.max(1))
            .collect()
            .await;

        batches.into_iter().flatten().collect()
    }
}

/// Newest first. Timestamps are parsed once; anything unparseable sorts after
/// every parseable one, and ties keep their incoming order.
pub fn sort_articles(articles: Vec<Article>, time: &TimeNormalizer) -> Vec<Article> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, Article)> = articles
        .into_iter()
        .map(|article| (time.parse(&article.published), article))
        .collect();

    // None < Some(_), so descending order leaves unparseable entries last
    keyed.sort_by(|a, b| b.0.cmp(&a.0));

    keyed.into_iter().map(|(_, article)| article).collect()
}

pub fn group_by_domain(articles: &[Article]) -> FeedResult {
    let mut result = FeedResult::new();

    for article in articles {
        let Some(domain) = domain_of(&article.url) else {
            continue;
        };
        let simple = SimpleArticle::from_article(article, &domain);
        result.entry(domain).or_default().push(simple);
    }

    result
}

/// Host of a site URL, with the port when one is given explicitly.
pub fn domain_of(site_url: &str) -> Option<String> {
    let url = Url::parse(site_url).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;

    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
