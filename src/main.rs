use std::time::Instant;

use fcircle::aggregator::Aggregator;
use fcircle::config::Config;
use fcircle::fetcher::Fetcher;
use fcircle::friends::{load_remote_friends, write_result};
use fcircle::timezone::TimeNormalizer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fcircle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("FCIRCLE_CONFIG").unwrap_or_else(|_| "fcircle.toml".to_string());
    let mut config = Config::load(&config_path)?;
    if let Ok(url) = std::env::var("FRIENDS_URL") {
        config.friends_url = url;
    }
    info!("Loaded configuration from {}", config_path);

    let start = Instant::now();
    let time = TimeNormalizer::new(&config.timezone);

    let fetcher = Fetcher::new(config.fetch_options(), time)?;
    let client = reqwest::Client::builder()
        .timeout(fetcher.options().timeout)
        .user_agent(fetcher.options().user_agent.as_str())
        .build()?;
    let friends = load_remote_friends(&client, &config.friends_url).await?;

    let aggregator = Aggregator::new(fetcher, config.crawl_options(), time);
    let result = aggregator.crawl(&friends).await;

    write_result(&config.output_path, &result).await?;
    info!("Finished in {:?}", start.elapsed());

    Ok(())
}
