use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;

use super::{feed_client, fetch_and_parse_feed, SourceFetcher};
use crate::error::FetchError;
use crate::model::{Category, NewsItem, Source};

const FEED_URL_TEMPLATE: &str = "https://www.youtube.com/feeds/videos.xml?channel_id=";

/// Fetches recent videos for one YouTube channel via the channel RSS feed.
///
/// The feed's media description stands in for the item description when
/// present; `description` is optional by contract.
pub struct YouTubeChannelFetcher {
    channel_id: String,
    client: Client,
}

impl YouTubeChannelFetcher {
    pub fn new(channel_id: String) -> Result<Self> {
        Ok(Self {
            channel_id,
            client: feed_client()?,
        })
    }
}

#[async_trait]
impl SourceFetcher for YouTubeChannelFetcher {
    fn name(&self) -> String {
        format!("youtube:{}", self.channel_id)
    }

    fn category(&self) -> Category {
        Category::Videos
    }

    async fn fetch(&self, lookback_hours: u64) -> Result<Vec<NewsItem>, FetchError> {
        let url = format!("{}{}", FEED_URL_TEMPLATE, self.channel_id);
        let feed = fetch_and_parse_feed(&self.client, &url)
            .await
            .map_err(FetchError)?;

        let cutoff = Utc::now() - Duration::hours(lookback_hours as i64);
        let mut items = Vec::new();

        for entry in feed.entries {
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
                continue;
            }

            let author = entry
                .authors
                .first()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "YouTube".to_string());
            let description = entry
                .media
                .first()
                .and_then(|m| m.description.as_ref())
                .map(|t| t.content.clone());

            items.push(NewsItem {
                guid: entry.id,
                source: Source::YouTube,
                title,
                description,
                url: link,
                published_at,
                author,
                digest: None,
            });
        }

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(items)
    }
}
