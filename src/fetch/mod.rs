use anyhow::{Context, Result};
use async_trait::async_trait;
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

use crate::error::FetchError;
use crate::model::{Category, NewsItem};

pub mod rss;
pub mod youtube;

const FETCH_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "aidigest/0.1.0";

/// One independent content source.
///
/// Implementations own their window filtering: given a lookback in hours
/// they return only items published inside it, newest first. Retry and
/// timeout policy also lives here, not in the scraping stage.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Name used in logs and soft-failure entries.
    fn name(&self) -> String;

    /// Enrichment batch this source's items belong to.
    fn category(&self) -> Category;

    async fn fetch(&self, lookback_hours: u64) -> Result<Vec<NewsItem>, FetchError>;
}

pub(crate) fn feed_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build reqwest client")
}

/// Downloads and parses a feed, retrying transient failures (network errors,
/// 5xx, 429) with exponential backoff. Client errors fail immediately.
pub(crate) async fn fetch_and_parse_feed(client: &Client, url: &str) -> Result<Feed> {
    let max_retries = 3;
    let mut last_error = None;

    for attempt in 1..=max_retries {
        if attempt > 1 {
            let backoff = Duration::from_secs(2u64.pow(attempt - 2)); // 1s, 2s
            tracing::info!(
                "retrying feed fetch for {} (attempt {}/{}) after {:?}",
                url,
                attempt,
                max_retries,
                backoff
            );
            tokio::time::sleep(backoff).await;
        }

        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    let bytes = response
                        .bytes()
                        .await
                        .context("failed to read feed response body")?;
                    let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;
                    return Ok(feed);
                } else if status.is_server_error()
                    || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                {
                    last_error = Some(anyhow::anyhow!("feed fetch failed with status: {}", status));
                } else {
                    // 4xx other than 429 is likely permanent
                    return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
                }
            }
            Err(e) => {
                last_error = Some(anyhow::Error::new(e).context("network error during feed fetch"));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("feed fetch failed after retries")))
}
