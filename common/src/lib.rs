/*!
common/src/lib.rs

Shared configuration types for notifeed.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with default/override merging
- The flattened per-run list of feed sources
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Remote database (Notion) configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Integration token pasted directly into the config file.
    pub token: Option<String>,
    /// Name of an environment variable holding the integration token.
    /// Consulted when `token` is absent.
    pub token_env: Option<String>,
    /// Name of the target database; resolved to an id at startup via search.
    pub database: String,
    pub timeout_seconds: Option<u64>,
}

impl NotionConfig {
    /// Resolve the integration token: inline value first, env var second.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let var = self.token_env.as_deref().unwrap_or("NOTION_API_TOKEN");
        std::env::var(var).with_context(|| format!("token env var '{}' not set", var))
    }
}

/// Sync behavior configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Trailing window, in days, for both admission and archival.
    pub window_days: Option<i64>,
    /// Emit image blocks for top-level <img> elements.
    pub image_blocks: Option<bool>,
    pub fetch_timeout_seconds: Option<u64>,
}

/// One feed to read, carrying the category label of its config group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    pub tag: String,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub notion: NotionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Map of category tag -> feed URLs.
    #[serde(default)]
    pub feeds: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Flatten the `tag -> urls` map into one source list.
    /// The map is ordered, so the result is stable across runs.
    pub fn feed_sources(&self) -> Vec<FeedSource> {
        self.feeds
            .iter()
            .flat_map(|(tag, urls)| {
                urls.iter().map(move |url| FeedSource {
                    url: url.clone(),
                    tag: tag.clone(),
                })
            })
            .collect()
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
