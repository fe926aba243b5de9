/*
notifeed - single-run feed synchronizer.
Reads the configured feeds, creates remote documents for new recent entries
and archives documents that fell out of the retention window, then exits.
*/

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use common::Config;
use notifeed::blocks::HtmlBlockConverter;
use notifeed::recency::DEFAULT_WINDOW_DAYS;
use notifeed::storage::notion::DEFAULT_API_URL;
use notifeed::storage::{DocumentStore, NotionStore};
use notifeed::sync::SyncEngine;

#[derive(Parser, Debug)]
#[command(name = "notifeed", about = "Sync RSS/Atom feeds into a Notion database")]
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
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let default_path = PathBuf::from("config.default.toml");
    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() {
            Some(&default_path)
        } else {
            None
        },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override_file = ?override_path, "configuration loaded");

    let sources = config.feed_sources();
    if sources.is_empty() {
        error!("no feeds configured");
        return Err(anyhow::anyhow!("no feeds configured"));
    }

    let token = config.notion.resolve_token()?;
    let store = NotionStore::new(
        DEFAULT_API_URL,
        token,
        config.notion.timeout_seconds.unwrap_or(10),
    )?;

    let database_id = store
        .find_database_id(&config.notion.database)
        .await
        .with_context(|| format!("failed to resolve database '{}'", config.notion.database))?;
    info!(database = %config.notion.database, database_id = %database_id, "remote database resolved");

    let engine = SyncEngine::new(
        store,
        database_id,
        Duration::days(config.sync.window_days.unwrap_or(DEFAULT_WINDOW_DAYS)),
        HtmlBlockConverter::new(config.sync.image_blocks.unwrap_or(false)),
        config.sync.fetch_timeout_seconds.unwrap_or(10),
    );

    let report = engine.run(&sources).await;
    info!(created = report.created, archived = report.archived, "notifeed run finished");
    Ok(())
}
