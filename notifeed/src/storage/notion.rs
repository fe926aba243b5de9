use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::DocumentStore;
use crate::blocks::ContentBlock;
use crate::entry::NormalizedEntry;
use crate::ingestion::USER_AGENT;

pub const DEFAULT_API_URL: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion REST implementation of the document store.
///
/// The base URL is injectable so tests can point the client at a mock
/// server. Database queries only return non-archived pages, which is what
/// makes the existence check and the stale sweep ignore archived documents
/// without an extra filter.
pub struct NotionStore {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl NotionStore {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    async fn send(&self, method: Method, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("remote store error {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("failed to parse remote store response")
    }

    /// Run a database query, following pagination cursors to the end.
    async fn query_all(&self, database_id: &str, filter: Value) -> Result<Vec<String>> {
        let path = format!("/v1/databases/{}/query", database_id);
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "filter": filter.clone() });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }

            let value = self.send(Method::POST, &path, &body).await?;
            let page: QueryPage =
                serde_json::from_value(value).context("unexpected query response shape")?;

            ids.extend(page.results.into_iter().map(|o| o.id));
            if !page.has_more {
                return Ok(ids);
            }
            cursor = page.next_cursor;
            if cursor.is_none() {
                return Ok(ids);
            }
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for NotionStore {
    async fn find_database_id(&self, query: &str) -> Result<String> {
        let body = json!({
            "query": query,
            "filter": { "property": "object", "value": "database" }
        });
        let value = self.send(Method::POST, "/v1/search", &body).await?;
        let page: QueryPage =
            serde_json::from_value(value).context("unexpected search response shape")?;

        page.results
            .into_iter()
            .next()
            .map(|o| o.id)
            .with_context(|| format!("no database matched query '{}'", query))
    }

    async fn title_exists(&self, database_id: &str, title: &str) -> Result<bool> {
        let filter = json!({
            "property": "title",
            "rich_text": { "equals": title }
        });
        let ids = self.query_all(database_id, filter).await?;
        Ok(!ids.is_empty())
    }

    async fn create_document(
        &self,
        database_id: &str,
        entry: &NormalizedEntry,
        blocks: &[ContentBlock],
    ) -> Result<()> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": page_properties(entry),
            "children": blocks.iter().map(block_payload).collect::<Vec<_>>(),
        });
        self.send(Method::POST, "/v1/pages", &body).await?;
        Ok(())
    }

    async fn stale_before(
        &self,
        database_id: &str,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<String>> {
        let filter = json!({
            "property": "Article Date",
            "date": { "before": iso_date(cutoff) }
        });
        self.query_all(database_id, filter).await
    }

    async fn archive(&self, document_id: &str) -> Result<()> {
        let body = json!({ "archived": true });
        self.send(Method::PATCH, &format!("/v1/pages/{}", document_id), &body)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    results: Vec<ObjectRef>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    id: String,
}

fn iso_date(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn page_properties(entry: &NormalizedEntry) -> Value {
    json!({
        "title": {
            "title": [{ "type": "text", "text": { "content": entry.title } }]
        },
        "Author": {
            "rich_text": [{ "type": "text", "text": { "content": entry.author } }]
        },
        "Article Date": {
            "date": { "start": iso_date(entry.published_at) }
        },
        "Link": { "url": entry.link.as_str() },
        "Category": { "select": { "name": entry.tag } },
        "Content Type": { "select": { "name": entry.body_kind.label() } },
    })
}

fn block_payload(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Paragraph { text } => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": rich_text(text, None),
        }),
        ContentBlock::Heading { level, text } => {
            let kind = format!("heading_{}", level);
            let mut value = json!({ "object": "block", "type": kind.as_str() });
            value[kind.as_str()] = rich_text(text, None);
            value
        }
        ContentBlock::Link { text, url } => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": rich_text(text, Some(url)),
        }),
        ContentBlock::Image { url } => json!({
            "object": "block",
            "type": "image",
            "image": { "type": "external", "external": { "url": url } },
        }),
    }
}

fn rich_text(text: &str, link: Option<&str>) -> Value {
    let mut node = json!({ "type": "text", "text": { "content": text } });
    if let Some(url) = link {
        node["text"]["link"] = json!({ "url": url });
    }
    json!({ "rich_text": [node] })
}
