use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use super::{feed_client, fetch_and_parse_feed, SourceFetcher};
use crate::error::FetchError;
use crate::model::{Category, NewsItem, Source};

/// Fetches article items for one publisher from one or more RSS/Atom feeds.
pub struct ArticleFeedFetcher {
    source: Source,
    urls: Vec<String>,
    client: Client,
}

impl ArticleFeedFetcher {
    pub fn new(source: Source, urls: Vec<String>) -> Result<Self> {
        Ok(Self {
            source,
            urls,
            client: feed_client()?,
        })
    }
}

#[async_trait]
impl SourceFetcher for ArticleFeedFetcher {
    fn name(&self) -> String {
        self.source.as_str().to_string()
    }

    fn category(&self) -> Category {
        Category::Articles
    }

    async fn fetch(&self, lookback_hours: u64) -> Result<Vec<NewsItem>, FetchError> {
        let cutoff = Utc::now() - Duration::hours(lookback_hours as i64);
        let mut items = Vec::new();
        let mut fetched_any = false;
        let mut last_error = None;

        for url in &self.urls {
            let feed = match fetch_and_parse_feed(&self.client, url).await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!("{}: feed {} failed: {:#}", self.source, url, e);
                    last_error = Some(e);
                    continue;
                }
            };
            fetched_any = true;

            for entry in feed.entries {
                // Prefer published, fall back to updated; skip undated entries
                let Some(published_at) = entry.published.or(entry.updated) else {
                    continue;
                };
                if published_at < cutoff {
                    continue;
                }

                let title = entry
                    .title
                    .as_ref()
                    .map(|t| t.content.clone())
                    .unwrap_or_default();
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default();
                if title.is_empty() || link.is_empty() {
                    debug!("{}: skipping entry without title or link", self.source);
                    continue;
                }

                items.push(NewsItem {
                    guid: entry.id,
                    source: self.source,
                    title,
                    description: entry.summary.map(|s| s.content),
                    url: link,
                    published_at,
                    author: self.source.as_str().to_string(),
                    digest: None,
                });
            }
        }

        // The source as a whole only fails when every one of its feeds did.
        if !fetched_any {
            if let Some(e) = last_error {
                return Err(FetchError(e));
            }
        }

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(items)
    }
}
