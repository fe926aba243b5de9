use anyhow::Result;
use chrono::NaiveDateTime;

use crate::blocks::ContentBlock;
use crate::entry::NormalizedEntry;

/// Narrow interface to the remote paginated-database service.
///
/// The sync engine only ever needs these five operations; everything else
/// about the remote API stays behind the implementation.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resolve the target database id from a name query. Called once at startup.
    async fn find_database_id(&self, query: &str) -> Result<String>;

    /// True when a non-archived document with exactly this title exists.
    async fn title_exists(&self, database_id: &str, title: &str) -> Result<bool>;

    /// Create a document from a normalized entry and its body blocks.
    async fn create_document(
        &self,
        database_id: &str,
        entry: &NormalizedEntry,
        blocks: &[ContentBlock],
    ) -> Result<()>;

    /// Ids of non-archived documents dated strictly before `cutoff`.
    async fn stale_before(&self, database_id: &str, cutoff: NaiveDateTime)
        -> Result<Vec<String>>;

    /// Mark a document archived; it stays in the database but is hidden.
    async fn archive(&self, document_id: &str) -> Result<()>;
}

pub mod notion;

pub use notion::NotionStore;
