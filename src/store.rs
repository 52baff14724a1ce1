//! SQLite persistence for news items.
//!
//! Insertion is idempotent on `guid`: re-deriving an item that already
//! exists is a no-op, never an error and never an overwrite, so historical
//! rows (including their digests) are immutable once stored.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::PersistenceError;
use crate::model::NewsItem;

/// Outcome of one upsert call. `attempted` counts every input item;
/// `inserted` counts the rows that were actually new.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub attempted: usize,
    pub inserted: usize,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if missing) the database file at `path`, including
    /// its parent directory. WAL mode, small pool.
    pub async fn open(path: &str) -> Result<Self, PersistenceError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory database; a single connection so every handle sees the
    /// same data. Used by tests.
    pub async fn open_in_memory() -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Idempotent schema setup.
    pub async fn create_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guid TEXT NOT NULL UNIQUE,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                url TEXT NOT NULL,
                published_at TEXT NOT NULL,
                author TEXT NOT NULL,
                digest TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts items inside a single transaction with conflict-on-guid
    /// ignored at the database level (no read-then-write race). Empty input
    /// is a no-op that does not touch storage.
    pub async fn upsert_items(&self, items: &[NewsItem]) -> Result<UpsertOutcome, PersistenceError> {
        if items.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for item in items {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO news_items
                    (guid, source, title, description, url, published_at, author, digest)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.guid)
            .bind(item.source.as_str())
            .bind(&item.title)
            .bind(item.description.as_deref())
            .bind(&item.url)
            .bind(item.published_at)
            .bind(&item.author)
            .bind(item.digest.as_deref())
            .execute(&mut tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;

        info!(
            "persisted {} new of {} attempted items",
            inserted,
            items.len()
        );
        Ok(UpsertOutcome {
            attempted: items.len(),
            inserted,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use chrono::Utc;

    fn item(guid: &str, digest: Option<&str>) -> NewsItem {
        NewsItem {
            guid: guid.to_string(),
            source: Source::OpenAi,
            title: format!("title {guid}"),
            description: Some("desc".to_string()),
            url: format!("https://example.com/{guid}"),
            published_at: Utc::now(),
            author: "OpenAI".to_string(),
            digest: digest.map(str::to_string),
        }
    }

    async fn test_store() -> Store {
        let store = Store::open_in_memory().await.expect("open store");
        store.create_schema().await.expect("create schema");
        store
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let store = test_store().await;

        let outcome = store.upsert_items(&[]).await.expect("upsert");

        assert_eq!(outcome, UpsertOutcome::default());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_items")
            .fetch_one(store.pool())
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn inserting_the_same_guid_twice_keeps_one_row() {
        let store = test_store().await;

        let first = store
            .upsert_items(&[item("a1", Some("first digest"))])
            .await
            .expect("first upsert");
        assert_eq!(first, UpsertOutcome { attempted: 1, inserted: 1 });

        // A later run re-derives the same guid; still counted as attempted,
        // but no new row appears.
        let second = store
            .upsert_items(&[item("a1", Some("other digest"))])
            .await
            .expect("second upsert");
        assert_eq!(second, UpsertOutcome { attempted: 1, inserted: 0 });

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_items")
            .fetch_one(store.pool())
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn existing_digest_is_never_clobbered_by_a_later_duplicate() {
        let store = test_store().await;

        store
            .upsert_items(&[item("a1", Some("original digest"))])
            .await
            .expect("first upsert");

        // Same guid arrives undigested in a later run
        store
            .upsert_items(&[item("a1", None)])
            .await
            .expect("second upsert");

        let digest: Option<String> =
            sqlx::query_scalar("SELECT digest FROM news_items WHERE guid = 'a1'")
                .fetch_one(store.pool())
                .await
                .expect("digest");
        assert_eq!(digest.as_deref(), Some("original digest"));
    }

    #[tokio::test]
    async fn mixed_batch_reports_only_new_rows_as_inserted() {
        let store = test_store().await;

        store
            .upsert_items(&[item("a1", None)])
            .await
            .expect("seed");

        let outcome = store
            .upsert_items(&[item("a1", None), item("b1", None), item("b2", None)])
            .await
            .expect("mixed upsert");

        assert_eq!(outcome, UpsertOutcome { attempted: 3, inserted: 2 });
    }

    #[tokio::test]
    async fn create_schema_is_idempotent() {
        let store = test_store().await;
        store.create_schema().await.expect("second create_schema");

        store
            .upsert_items(&[item("a1", None)])
            .await
            .expect("upsert still works");
    }
}
