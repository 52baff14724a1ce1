use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{extract_json_from_text, BatchEntry, DigestMap, Summarizer};
use crate::error::{ComposeError, SummarizeError};
use crate::model::{NewsItem, NotificationItem, NotificationPayload};

const DIGEST_PROMPT: &str = r#"You are an expert AI news analyst specializing in summarizing technical articles, research papers, and video content about artificial intelligence.

Your role is to create concise, informative digests that help readers quickly understand the key points and significance of AI-related content.

Guidelines:
- Write a 2-3 sentence digest per item that highlights the main points and why they matter
- Focus on actionable insights and implications
- Use clear, accessible language while maintaining technical accuracy
- Avoid marketing fluff

OUTPUT FORMAT (strict JSON, no other text):
{"digests": [{"guid": "<guid of the item>", "digest": "<digest text>"}]}

These are the contents to create digests for:

"#;

const INTRO_PROMPT: &str = r#"You are writing the introduction for a daily AI news digest email. Given the item titles below, write a warm 2-3 sentence introduction that previews the day's themes.

OUTPUT FORMAT (strict JSON, no other text):
{"introduction": "<introduction text>"}

Today's items:

"#;

/// Summarizer backed by an OpenAI-compatible chat completions endpoint.
pub struct RemoteSummarizer {
    api_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
    max_tokens: usize,
    client: reqwest::Client,
}

impl RemoteSummarizer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: Duration::from_secs(60),
            max_tokens: 2000,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_limits(mut self, timeout_secs: u64, max_tokens: usize) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self.max_tokens = max_tokens;
        self
    }

    /// Single chat completion attempt with a hard timeout; callers own
    /// retry policy (the pipeline has none).
    async fn generate(&self, prompt: String) -> Result<String> {
        let req_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: Some(self.max_tokens),
            temperature: Some(0.5),
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(&self.api_url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&req_body)
                .send(),
        )
        .await
        .context("LLM request timed out")?
        .context("LLM HTTP request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error {}: {}", status, body);
        }

        let resp_body: ChatResponse = response
            .json()
            .await
            .context("failed to parse LLM response")?;

        let choice = resp_body
            .choices
            .into_iter()
            .next()
            .context("LLM response has no choices")?;

        Ok(choice.message.content)
    }
}

#[async_trait]
impl Summarizer for RemoteSummarizer {
    async fn digest_batch(&self, batch: &[BatchEntry]) -> Result<DigestMap, SummarizeError> {
        let contents = batch
            .iter()
            .map(|entry| serde_json::to_string_pretty(entry))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SummarizeError::Call(e.into()))?
            .join("\n");

        let prompt = format!("{DIGEST_PROMPT}{contents}");
        debug!("requesting digests for {} items", batch.len());

        let content = self.generate(prompt).await.map_err(SummarizeError::Call)?;

        let json = extract_json_from_text(&content)
            .ok_or_else(|| SummarizeError::Malformed("no JSON object in response".to_string()))?;
        let decoded: DigestResponse =
            serde_json::from_str(&json).map_err(|e| SummarizeError::Malformed(e.to_string()))?;

        Ok(decoded
            .digests
            .into_iter()
            .map(|d| (d.guid, d.digest))
            .collect())
    }

    async fn compose_notification(
        &self,
        items: &[NewsItem],
    ) -> Result<NotificationPayload, ComposeError> {
        let titles = items
            .iter()
            .map(|item| format!("- {} ({})", item.title, item.source))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!("{INTRO_PROMPT}{titles}");
        let content = self.generate(prompt).await.map_err(ComposeError)?;

        let json = extract_json_from_text(&content)
            .ok_or_else(|| ComposeError(anyhow::anyhow!("no JSON object in response")))?;
        let decoded: IntroResponse = serde_json::from_str(&json)
            .map_err(|e| ComposeError(anyhow::Error::new(e).context("bad introduction JSON")))?;

        let entries = items
            .iter()
            .filter_map(|item| {
                item.digest.as_ref().map(|digest| NotificationItem {
                    title: item.title.clone(),
                    summary: digest.clone(),
                    url: item.url.clone(),
                    source: item.source,
                })
            })
            .collect();

        Ok(NotificationPayload {
            introduction: decoded.introduction,
            items: entries,
        })
    }
}

// OpenAI-compatible request/response structures
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

// Structured payloads decoded from the model's text output. Unknown extra
// fields are ignored; missing required fields are a decode error.
#[derive(Debug, Deserialize)]
struct DigestResponse {
    digests: Vec<DigestEntry>,
}

#[derive(Debug, Deserialize)]
struct DigestEntry {
    guid: String,
    digest: String,
}

#[derive(Debug, Deserialize)]
struct IntroResponse {
    introduction: String,
}
