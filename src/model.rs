use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a news item. Stored as a string tag in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    OpenAi,
    Anthropic,
    Modular,
    YouTube,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::OpenAi => "OpenAI",
            Source::Anthropic => "Anthropic",
            Source::Modular => "Modular",
            Source::YouTube => "YouTube",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical grouping used by the enrichment stage: every category is
/// summarized as one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Articles,
    Videos,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Articles => "articles",
            Category::Videos => "videos",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized unit of content (article or video).
///
/// `guid` is the deduplication key: unique within a batch and across runs,
/// enforced by the storage layer with insert-or-ignore semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub guid: String,
    pub source: Source,
    pub title: String,
    /// Absent for some sources; video items may carry feed-provided media
    /// text here instead of a real description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
    /// Set by the enrichment stage when the summarizer returns a digest for
    /// this guid; never overwritten once filled in the same run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// What the notifier delivers for a non-empty run. `None` in its place
/// signals the "nothing new today" variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub introduction: String,
    pub items: Vec<NotificationItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source: Source,
}
