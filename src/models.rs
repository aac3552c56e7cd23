use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A configured blog source, as listed in the remote friends file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    /// Feed URL (RSS or Atom)
    pub rss: String,
    /// Site URL, used as the grouping key for this friend's articles
    pub url: String,
    #[serde(default)]
    pub avatar: String,
}

/// One normalized feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// Local timestamp in `YYYY-MM-DD HH:MM:SS`
    pub published: String,
    pub author: String,
    pub avatar: String,
    /// Sanitized and truncated HTML
    pub content: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleArticle {
    pub title: String,
    pub link: String,
    pub source: String,
    pub date: String,
}

impl SimpleArticle {
    pub fn from_article(article: &Article, source: &str) -> Self {
        Self {
            title: article.title.clone(),
            link: article.link.clone(),
            source: source.to_string(),
            date: article.published.clone(),
        }
    }
}

/// Articles grouped by source domain, newest first within each group.
pub type FeedResult = BTreeMap<String, Vec<SimpleArticle>>;
