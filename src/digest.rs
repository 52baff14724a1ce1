//! Digest enrichment stage.
//!
//! Each category is summarized as a single external call; categories run
//! concurrently and are all joined before the stage returns. A failed call
//! leaves its whole category undigested; no item is ever dropped and no
//! error escapes the stage.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{BatchEntry, Summarizer};
use crate::model::{Category, NewsItem};
use crate::report::{SoftFailure, Stage};

pub struct EnrichOutcome {
    pub batches: BTreeMap<Category, Vec<NewsItem>>,
    pub failures: Vec<SoftFailure>,
}

impl EnrichOutcome {
    pub fn digested(&self) -> usize {
        self.batches
            .values()
            .flatten()
            .filter(|item| item.digest.is_some())
            .count()
    }
}

pub async fn enrich_all(
    summarizer: Arc<dyn Summarizer>,
    batches: BTreeMap<Category, Vec<NewsItem>>,
) -> EnrichOutcome {
    let mut out: BTreeMap<Category, Vec<NewsItem>> = BTreeMap::new();
    let mut handles = Vec::new();

    for (category, items) in batches {
        // Empty categories enrich to empty categories without an external call
        if items.is_empty() {
            out.insert(category, items);
            continue;
        }
        let summarizer = Arc::clone(&summarizer);
        let entries: Vec<BatchEntry> = items.iter().map(BatchEntry::from_item).collect();
        let handle = tokio::spawn(async move { summarizer.digest_batch(&entries).await });
        handles.push((category, items, handle));
    }

    let mut failures = Vec::new();

    for (category, mut items, handle) in handles {
        match handle.await {
            Ok(Ok(digest_map)) => {
                // Only guids from this batch are eligible; anything else the
                // summarizer returned is ignored, and an already-set digest
                // is never overwritten.
                let mut applied = 0;
                for item in items.iter_mut() {
                    if item.digest.is_some() {
                        continue;
                    }
                    if let Some(text) = digest_map.get(&item.guid) {
                        item.digest = Some(text.clone());
                        applied += 1;
                    }
                }
                info!("{}: applied {}/{} digests", category, applied, items.len());
            }
            Ok(Err(e)) => {
                warn!("{}: enrichment failed, passing items through: {}", category, e);
                failures.push(SoftFailure {
                    stage: Stage::Enrich,
                    unit: category.to_string(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                warn!("{}: enrichment task panicked: {}", category, e);
                failures.push(SoftFailure {
                    stage: Stage::Enrich,
                    unit: category.to_string(),
                    message: format!("task panicked: {e}"),
                });
            }
        }
        out.insert(category, items);
    }

    EnrichOutcome {
        batches: out,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ComposeError, SummarizeError};
    use crate::llm::DigestMap;
    use crate::model::{NotificationPayload, Source};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(guid: &str, source: Source) -> NewsItem {
        NewsItem {
            guid: guid.to_string(),
            source,
            title: format!("title {guid}"),
            description: Some("desc".to_string()),
            url: format!("https://example.com/{guid}"),
            published_at: Utc::now(),
            author: source.as_str().to_string(),
            digest: None,
        }
    }

    struct ScriptedSummarizer {
        result: Result<Vec<(String, String)>, String>,
        calls: AtomicUsize,
    }

    impl ScriptedSummarizer {
        fn returning(pairs: &[(&str, &str)]) -> Self {
            Self {
                result: Ok(pairs
                    .iter()
                    .map(|(g, d)| (g.to_string(), d.to_string()))
                    .collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn digest_batch(&self, _batch: &[BatchEntry]) -> Result<DigestMap, SummarizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(pairs) => Ok(pairs.iter().cloned().collect()),
                Err(message) => Err(SummarizeError::Malformed(message.clone())),
            }
        }

        async fn compose_notification(
            &self,
            _items: &[NewsItem],
        ) -> Result<NotificationPayload, ComposeError> {
            unreachable!("not exercised by these tests")
        }
    }

    #[tokio::test]
    async fn digests_are_applied_by_guid() {
        let summarizer = Arc::new(ScriptedSummarizer::returning(&[
            ("a1", "digest for a1"),
            ("b1", "digest for b1"),
        ]));
        let mut batches = BTreeMap::new();
        batches.insert(
            Category::Articles,
            vec![
                item("a1", Source::OpenAi),
                item("b1", Source::Anthropic),
                item("b2", Source::Anthropic),
            ],
        );

        let outcome = enrich_all(summarizer, batches).await;

        let articles = &outcome.batches[&Category::Articles];
        assert_eq!(articles[0].digest.as_deref(), Some("digest for a1"));
        assert_eq!(articles[1].digest.as_deref(), Some("digest for b1"));
        assert!(articles[2].digest.is_none());
        assert_eq!(outcome.digested(), 2);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn unknown_guids_in_the_response_are_ignored() {
        let summarizer = Arc::new(ScriptedSummarizer::returning(&[
            ("a1", "good"),
            ("made-up-guid", "should never land anywhere"),
        ]));
        let mut batches = BTreeMap::new();
        batches.insert(Category::Articles, vec![item("a1", Source::OpenAi)]);

        let outcome = enrich_all(summarizer, batches).await;

        let articles = &outcome.batches[&Category::Articles];
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].digest.as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn failed_category_passes_through_undigested() {
        let summarizer = Arc::new(ScriptedSummarizer::failing("response was garbage"));
        let mut batches = BTreeMap::new();
        batches.insert(
            Category::Videos,
            vec![item("v1", Source::YouTube), item("v2", Source::YouTube)],
        );

        let outcome = enrich_all(summarizer, batches).await;

        let videos = &outcome.batches[&Category::Videos];
        assert_eq!(videos.len(), 2);
        assert!(videos.iter().all(|v| v.digest.is_none()));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].unit, "videos");
        assert_eq!(outcome.failures[0].stage, Stage::Enrich);
    }

    #[tokio::test]
    async fn empty_category_makes_no_external_call() {
        let summarizer = Arc::new(ScriptedSummarizer::returning(&[]));
        let mut batches = BTreeMap::new();
        batches.insert(Category::Articles, Vec::new());

        let outcome = enrich_all(Arc::clone(&summarizer) as Arc<dyn Summarizer>, batches).await;

        assert!(outcome.batches[&Category::Articles].is_empty());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn categories_are_enriched_independently() {
        // One call per non-empty category
        let summarizer = Arc::new(ScriptedSummarizer::returning(&[("a1", "x"), ("v1", "y")]));
        let mut batches = BTreeMap::new();
        batches.insert(Category::Articles, vec![item("a1", Source::OpenAi)]);
        batches.insert(Category::Videos, vec![item("v1", Source::YouTube)]);

        let outcome = enrich_all(Arc::clone(&summarizer) as Arc<dyn Summarizer>, batches).await;

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.digested(), 2);
    }
}
