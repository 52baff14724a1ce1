//! Orchestrator: SCRAPE → ENRICH → PERSIST → NOTIFY → DONE.
//!
//! Configuration problems abort before scraping starts; once SCRAPE begins
//! the run cannot abort. Every later stage executes with whatever partial
//! results exist, so at minimum the "nothing new" notification still goes
//! out. A storage failure is recorded on the report and fails the run's
//! exit status, but notification is still attempted with the in-memory set.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::digest;
use crate::fetch::SourceFetcher;
use crate::llm::Summarizer;
use crate::model::NewsItem;
use crate::notify::Notifier;
use crate::report::{RunReport, Stage};
use crate::scrape;
use crate::store::Store;

pub struct Runner {
    lookback_hours: u64,
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    summarizer: Arc<dyn Summarizer>,
    store: Store,
    notifier: Arc<dyn Notifier>,
}

impl Runner {
    pub fn new(
        lookback_hours: u64,
        fetchers: Vec<Arc<dyn SourceFetcher>>,
        summarizer: Arc<dyn Summarizer>,
        store: Store,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            lookback_hours,
            fetchers,
            summarizer,
            store,
            notifier,
        }
    }

    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        // SCRAPE
        info!(
            "scrape: {} sources, {}h lookback",
            self.fetchers.len(),
            self.lookback_hours
        );
        let scraped = scrape::scrape_all(&self.fetchers, self.lookback_hours).await;
        report.fetched = scraped.total();
        report.soft_failures.extend(scraped.failures);
        info!("scrape: {} items fetched", report.fetched);

        // ENRICH: always runs; empty batches enrich to empty batches
        let enriched = digest::enrich_all(Arc::clone(&self.summarizer), scraped.batches).await;
        report.digested = enriched.digested();
        report.soft_failures.extend(enriched.failures);
        info!("enrich: {} items digested", report.digested);

        // PERSIST: items without digests are persisted too
        let items: Vec<NewsItem> = enriched.batches.into_values().flatten().collect();
        match self.store.upsert_items(&items).await {
            Ok(outcome) => {
                report.persisted_attempted = outcome.attempted;
                report.persisted_new = outcome.inserted;
            }
            Err(e) => {
                error!("persist: storage failure: {}", e);
                report.persistence_error = Some(e.to_string());
            }
        }

        // NOTIFY: built from the enriched (pre-persistence) set, filtered to
        // digested items; zero digested items means the "nothing new" variant
        let digested: Vec<NewsItem> = items
            .iter()
            .filter(|item| item.digest.is_some())
            .cloned()
            .collect();

        let payload = if digested.is_empty() {
            None
        } else {
            match self.summarizer.compose_notification(&digested).await {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!("notify: compose failed, sending the caught-up variant: {}", e);
                    report.record_soft(Stage::Notify, "compose", e);
                    None
                }
            }
        };

        match self.notifier.deliver(payload.as_ref()).await {
            Ok(()) => report.notified = true,
            Err(e) => {
                warn!("notify: delivery failed: {}", e);
                report.record_soft(Stage::Notify, "delivery", e);
            }
        }

        report
    }
}
