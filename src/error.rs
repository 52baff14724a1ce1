use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problem. The only error that aborts a run before any
/// stage starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("lookback_hours must be at least 1")]
    ZeroLookback,
    #[error("no sources configured: need at least one youtube channel or article feed")]
    NoSources,
    #[error("article feed for {0} has no urls")]
    EmptyFeed(String),
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
    #[error("invalid email address {address}: {message}")]
    BadAddress { address: String, message: String },
    #[error("invalid smtp host {host}: {message}")]
    BadSmtpHost { host: String, message: String },
}

/// Per-source fetch failure. Isolated by the scraping stage: the failing
/// source contributes zero items and one soft failure.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct FetchError(#[from] pub anyhow::Error);

/// Per-category enrichment failure. The whole category passes through
/// undigested; nothing is dropped.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer call failed: {0}")]
    Call(#[source] anyhow::Error),
    #[error("summarizer response was not a valid digest structure: {0}")]
    Malformed(String),
}

/// Failure to build the notification payload. Soft: the run falls back to
/// the "nothing new" delivery.
#[derive(Debug, Error)]
#[error("failed to compose notification: {0}")]
pub struct ComposeError(#[from] pub anyhow::Error);

/// Storage-layer failure. Escalated: recorded on the run report and fails
/// the run's exit status, though notification is still attempted.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to prepare database file: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Delivery failure. Soft: logged on the run report only.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct NotifyError(#[from] pub anyhow::Error);
