//! Scatter-gather scraping stage.
//!
//! Runs every source fetcher on its own task, waits for all of them (a full
//! barrier, not a race), and merges results partitioned by category. One
//! job's failure or latency never blocks another's completion.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::fetch::SourceFetcher;
use crate::model::{Category, NewsItem};
use crate::report::{SoftFailure, Stage};

pub struct ScrapeOutcome {
    /// Merged results keyed by category; within a source the order the
    /// fetcher returned (newest first) is preserved.
    pub batches: BTreeMap<Category, Vec<NewsItem>>,
    pub failures: Vec<SoftFailure>,
}

impl ScrapeOutcome {
    pub fn total(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }
}

/// Dispatches all fetch jobs concurrently and joins them all before
/// returning. A failing or panicking job contributes zero items and one soft
/// failure; this stage itself never errors, even when every job failed.
pub async fn scrape_all(fetchers: &[Arc<dyn SourceFetcher>], lookback_hours: u64) -> ScrapeOutcome {
    let mut handles = Vec::with_capacity(fetchers.len());
    for fetcher in fetchers {
        let job = Arc::clone(fetcher);
        let name = job.name();
        let category = job.category();
        let handle = tokio::spawn(async move { job.fetch(lookback_hours).await });
        handles.push((name, category, handle));
    }

    let mut batches: BTreeMap<Category, Vec<NewsItem>> = BTreeMap::new();
    let mut failures = Vec::new();

    // Join in dispatch order so the merge stays deterministic. Merging
    // happens here, single-threaded, so no locks are needed.
    for (name, category, handle) in handles {
        match handle.await {
            Ok(Ok(items)) => {
                info!("{}: fetched {} items", name, items.len());
                batches.entry(category).or_default().extend(items);
            }
            Ok(Err(e)) => {
                warn!("{}: fetch failed: {:#}", name, e.0);
                failures.push(SoftFailure {
                    stage: Stage::Scrape,
                    unit: name,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                warn!("{}: fetch task panicked: {}", name, e);
                failures.push(SoftFailure {
                    stage: Stage::Scrape,
                    unit: name,
                    message: format!("task panicked: {e}"),
                });
            }
        }
    }

    ScrapeOutcome { batches, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::model::Source;
    use async_trait::async_trait;
    use chrono::Utc;

    fn item(guid: &str, source: Source) -> NewsItem {
        NewsItem {
            guid: guid.to_string(),
            source,
            title: format!("title {guid}"),
            description: None,
            url: format!("https://example.com/{guid}"),
            published_at: Utc::now(),
            author: source.as_str().to_string(),
            digest: None,
        }
    }

    struct StaticFetcher {
        name: String,
        category: Category,
        items: Vec<NewsItem>,
    }

    #[async_trait]
    impl SourceFetcher for StaticFetcher {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn category(&self) -> Category {
            self.category
        }

        async fn fetch(&self, _lookback_hours: u64) -> Result<Vec<NewsItem>, FetchError> {
            Ok(self.items.clone())
        }
    }

    struct FailingFetcher {
        name: String,
        category: Category,
    }

    #[async_trait]
    impl SourceFetcher for FailingFetcher {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn category(&self) -> Category {
            self.category
        }

        async fn fetch(&self, _lookback_hours: u64) -> Result<Vec<NewsItem>, FetchError> {
            Err(FetchError(anyhow::anyhow!("connection refused")))
        }
    }

    #[tokio::test]
    async fn one_failing_source_does_not_affect_the_others() {
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![
            Arc::new(FailingFetcher {
                name: "OpenAI".to_string(),
                category: Category::Articles,
            }),
            Arc::new(StaticFetcher {
                name: "Anthropic".to_string(),
                category: Category::Articles,
                items: vec![
                    item("b1", Source::Anthropic),
                    item("b2", Source::Anthropic),
                    item("b3", Source::Anthropic),
                ],
            }),
        ];

        let outcome = scrape_all(&fetchers, 24).await;

        let articles = &outcome.batches[&Category::Articles];
        assert_eq!(articles.len(), 3);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].unit, "OpenAI");
        assert_eq!(outcome.failures[0].stage, Stage::Scrape);
    }

    #[tokio::test]
    async fn results_are_partitioned_by_category() {
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![
            Arc::new(StaticFetcher {
                name: "OpenAI".to_string(),
                category: Category::Articles,
                items: vec![item("a1", Source::OpenAi)],
            }),
            Arc::new(StaticFetcher {
                name: "youtube:UC123".to_string(),
                category: Category::Videos,
                items: vec![item("v1", Source::YouTube), item("v2", Source::YouTube)],
            }),
        ];

        let outcome = scrape_all(&fetchers, 24).await;

        assert_eq!(outcome.total(), 3);
        assert_eq!(outcome.batches[&Category::Articles].len(), 1);
        assert_eq!(outcome.batches[&Category::Videos].len(), 2);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn per_source_order_is_preserved() {
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![Arc::new(StaticFetcher {
            name: "Anthropic".to_string(),
            category: Category::Articles,
            items: vec![
                item("newest", Source::Anthropic),
                item("middle", Source::Anthropic),
                item("oldest", Source::Anthropic),
            ],
        })];

        let outcome = scrape_all(&fetchers, 24).await;

        let guids: Vec<&str> = outcome.batches[&Category::Articles]
            .iter()
            .map(|i| i.guid.as_str())
            .collect();
        assert_eq!(guids, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn all_sources_failing_yields_empty_batches_not_an_error() {
        let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![
            Arc::new(FailingFetcher {
                name: "OpenAI".to_string(),
                category: Category::Articles,
            }),
            Arc::new(FailingFetcher {
                name: "youtube:UC123".to_string(),
                category: Category::Videos,
            }),
        ];

        let outcome = scrape_all(&fetchers, 24).await;

        assert_eq!(outcome.total(), 0);
        assert_eq!(outcome.failures.len(), 2);
    }
}
