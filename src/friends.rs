//! Input and output around a crawl: the remote friend list and the JSON result file.

use std::path::Path;

use anyhow::{bail, Context};
use reqwest::{Client, StatusCode};
use tracing::info;

use crate::models::{FeedResult, Friend};

/// Download the friend list (a JSON array of [`Friend`]).
///
/// Unlike individual feed failures, any error here is fatal for the run.
pub async fn load_remote_friends(client: &Client, url: &str) -> anyhow::Result<Vec<Friend>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to request friend list from {}", url))?;

    let status = response.status();
    if status != StatusCode::OK {
        bail!("failed to load friend list from {}: status {}", url, status);
    }

    let friends: Vec<Friend> = response
        .json()
        .await
        .with_context(|| format!("invalid friend list at {}", url))?;

    info!("Loaded {} friends from {}", friends.len(), url);
    Ok(friends)
}

/// Write the grouped result as two-space indented JSON, creating parent directories.
pub async fn write_result<P: AsRef<Path>>(path: P, result: &FeedResult) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    let mut json = serde_json::to_string_pretty(result)?;
    json.push('\n');

    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!("Wrote {} sources to {}", result.len(), path.display());
    Ok(())
}
