use anyhow::{Context, Result};
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

pub const USER_AGENT: &str = "notifeed/0.1.0";

/// Fetches a feed from the given URL and parses it.
/// One attempt only; the caller decides what a failed source means for the run.
pub async fn fetch_and_parse_feed(url: &str, timeout_secs: u64) -> Result<Feed> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build reqwest client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("network error during feed fetch")?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
    }

    let bytes = response.bytes().await.context("failed to read response body")?;
    let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;
    Ok(feed)
}
