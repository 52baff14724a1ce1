/*!
Run configuration, deserialized from a TOML file and validated eagerly.

An invalid or incomplete configuration is rejected before any pipeline stage
runs; secrets (LLM API key, SMTP password) are referenced by environment
variable name and resolved when the collaborators are constructed.
*/

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::model::Source;

fn default_lookback_hours() -> u64 {
    24
}

fn default_db_path() -> String {
    "data/aidigest.db".to_string()
}

fn default_llm_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions".to_string()
}

fn default_llm_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_llm_max_tokens() -> usize {
    2000
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_password_env() -> String {
    "EMAIL_PASSWORD".to_string()
}

/// Database configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the sqlite database file (e.g. "data/aidigest.db")
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// One article feed group: a source tag plus the feed URLs scraped for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleFeedConfig {
    pub source: Source,
    pub urls: Vec<String>,
}

/// Content sources scraped each run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// YouTube channel IDs, scraped via the channel RSS feed
    #[serde(default)]
    pub youtube_channels: Vec<String>,
    #[serde(default)]
    pub article_feeds: Vec<ArticleFeedConfig>,
}

/// Remote summarizer configuration (OpenAI-compatible chat endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_llm_api_url(),
            api_key_env: default_llm_api_key_env(),
            model: default_llm_model(),
            timeout_seconds: default_llm_timeout(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

/// Email delivery configuration. The SMTP password comes from the
/// environment variable named by `password_env`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    pub from: String,
    pub to: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

/// Top-level run configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How many hours each source fetcher looks back
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    pub email: EmailConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|source| ConfigError::Read {
                path: path.as_ref().to_path_buf(),
                source,
            })?;
        let cfg: Config = toml::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject invalid values eagerly, before any stage starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_hours == 0 {
            return Err(ConfigError::ZeroLookback);
        }
        if self.sources.youtube_channels.is_empty() && self.sources.article_feeds.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for feed in &self.sources.article_feeds {
            if feed.urls.is_empty() {
                return Err(ConfigError::EmptyFeed(feed.source.to_string()));
            }
        }
        Ok(())
    }
}
