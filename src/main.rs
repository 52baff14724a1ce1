/*
aidigest - scrape AI news sources, attach LLM digests, persist new items,
and email a daily summary. One invocation is one run.
*/

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use aidigest::config::Config;
use aidigest::error::ConfigError;
use aidigest::fetch::rss::ArticleFeedFetcher;
use aidigest::fetch::youtube::YouTubeChannelFetcher;
use aidigest::fetch::SourceFetcher;
use aidigest::llm::remote::RemoteSummarizer;
use aidigest::notify::email::EmailNotifier;
use aidigest::runner::Runner;
use aidigest::store::Store;

#[derive(Parser, Debug)]
#[command(name = "aidigest", about = "AI news aggregator with LLM digests")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config path: explicit flag must exist; otherwise fall back
    // from config.toml to the packaged defaults.
    let config_path = match args.config {
        Some(p) => {
            if !p.exists() {
                error!(path = ?p, "specified config file not found");
                anyhow::bail!("config file not found: {}", p.display());
            }
            p
        }
        None => {
            let p = PathBuf::from("config.toml");
            if p.exists() {
                p
            } else {
                PathBuf::from("config.default.toml")
            }
        }
    };

    let config = Config::from_file(&config_path).await?;
    info!(path = ?config_path, "configuration loaded");

    let store = Store::open(&config.database.path).await?;
    store.create_schema().await?;
    info!(db_path = %config.database.path, "database initialized");

    let api_key = std::env::var(&config.llm.api_key_env)
        .map_err(|_| ConfigError::MissingEnv(config.llm.api_key_env.clone()))?;
    let summarizer = Arc::new(
        RemoteSummarizer::new(&config.llm.api_url, api_key, &config.llm.model)
            .with_limits(config.llm.timeout_seconds, config.llm.max_tokens),
    );

    let notifier = Arc::new(EmailNotifier::from_config(&config.email)?);

    let mut fetchers: Vec<Arc<dyn SourceFetcher>> = Vec::new();
    for feed in &config.sources.article_feeds {
        fetchers.push(Arc::new(ArticleFeedFetcher::new(
            feed.source,
            feed.urls.clone(),
        )?));
    }
    for channel in &config.sources.youtube_channels {
        fetchers.push(Arc::new(YouTubeChannelFetcher::new(channel.clone())?));
    }

    let runner = Runner::new(
        config.lookback_hours,
        fetchers,
        summarizer,
        store,
        notifier,
    );
    let report = runner.run().await;

    for failure in &report.soft_failures {
        warn!(
            "soft failure [{}] {}: {}",
            failure.stage, failure.unit, failure.message
        );
    }
    info!("{}", report);

    if let Some(err) = &report.persistence_error {
        anyhow::bail!("run failed: {err}");
    }
    Ok(())
}
