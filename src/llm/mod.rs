use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{ComposeError, SummarizeError};
use crate::model::{NewsItem, NotificationPayload};

pub mod remote;

/// Run-scoped mapping from item guid to digest text. Produced by decoding
/// the summarizer's structured response, discarded after application.
pub type DigestMap = HashMap<String, String>;

/// The slice of an item the summarizer sees.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub guid: String,
    pub source: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BatchEntry {
    pub fn from_item(item: &NewsItem) -> Self {
        Self {
            guid: item.guid.clone(),
            source: item.source.as_str().to_string(),
            title: item.title.clone(),
            description: item.description.clone(),
        }
    }
}

/// External summarization capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// One call per batch, no retries at this layer. Returns digest text
    /// keyed by guid; guids the summarizer invents are discarded by the
    /// caller, and input guids missing from the result stay undigested.
    async fn digest_batch(&self, batch: &[BatchEntry]) -> Result<DigestMap, SummarizeError>;

    /// Builds the notification payload for a digested item set.
    async fn compose_notification(
        &self,
        items: &[NewsItem],
    ) -> Result<NotificationPayload, ComposeError>;
}

/// Extracts a JSON object from text that might wrap it in markdown fences
/// or a preamble.
pub fn extract_json_from_text(text: &str) -> Option<String> {
    // Content between ```json fences
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim().to_string());
        }
    }

    // Content between bare ``` fences
    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim().to_string());
        }
    }

    // First '{' to last '}'
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return Some(text[start..=end].to_string());
        }
    }

    None
}
