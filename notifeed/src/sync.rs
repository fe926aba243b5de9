use anyhow::Result;
use chrono::{Duration, NaiveDateTime, Utc};
use tracing::{error, info, warn};

use common::FeedSource;

use crate::blocks::HtmlBlockConverter;
use crate::entry;
use crate::ingestion;
use crate::recency;
use crate::storage::DocumentStore;

/// Counters for one run, logged when the run completes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub skipped_existing: usize,
    pub skipped_old: usize,
    pub skipped_invalid: usize,
    pub archived: usize,
    pub failed_sources: usize,
}

/// One sync run over a set of feed sources against one remote database.
///
/// Failures stay contained at the smallest enclosing loop: a fetch error
/// costs its source, a skip or store error costs its entry, an archive
/// error costs that document. Nothing past startup aborts the run.
pub struct SyncEngine<S: DocumentStore> {
    store: S,
    database_id: String,
    window: Duration,
    converter: HtmlBlockConverter,
    fetch_timeout_secs: u64,
}

impl<S: DocumentStore> SyncEngine<S> {
    pub fn new(
        store: S,
        database_id: String,
        window: Duration,
        converter: HtmlBlockConverter,
        fetch_timeout_secs: u64,
    ) -> Self {
        Self {
            store,
            database_id,
            window,
            converter,
            fetch_timeout_secs,
        }
    }

    /// Process every source, then archive documents that fell out of the
    /// window. A single captured `now` anchors both decisions.
    pub async fn run(&self, sources: &[FeedSource]) -> SyncReport {
        self.run_at(sources, Utc::now().naive_utc()).await
    }

    /// Same as `run` with an explicit evaluation point.
    pub async fn run_at(&self, sources: &[FeedSource], now: NaiveDateTime) -> SyncReport {
        let mut report = SyncReport::default();

        for source in sources {
            if let Err(e) = self.sync_source(source, now, &mut report).await {
                report.failed_sources += 1;
                error!(url = %source.url, error = %e, "source failed, moving on");
            }
        }

        self.archive_stale(now, &mut report).await;

        info!(
            created = report.created,
            skipped_existing = report.skipped_existing,
            skipped_old = report.skipped_old,
            skipped_invalid = report.skipped_invalid,
            archived = report.archived,
            failed_sources = report.failed_sources,
            "run complete"
        );
        report
    }

    async fn sync_source(
        &self,
        source: &FeedSource,
        now: NaiveDateTime,
        report: &mut SyncReport,
    ) -> Result<()> {
        let feed = ingestion::fetch_and_parse_feed(&source.url, self.fetch_timeout_secs).await?;
        if feed.entries.is_empty() {
            warn!(url = %source.url, "no entries in feed");
            return Ok(());
        }
        info!(url = %source.url, entries = feed.entries.len(), "processing feed");

        for raw in &feed.entries {
            let entry = match entry::normalize(raw, &source.tag) {
                Ok(entry) => entry,
                Err(reason) => {
                    report.skipped_invalid += 1;
                    warn!(url = %source.url, reason = %reason, "skipping entry");
                    continue;
                }
            };

            if !recency::is_recent(entry.published_at, now, self.window) {
                report.skipped_old += 1;
                continue;
            }

            match self.store.title_exists(&self.database_id, &entry.title).await {
                Ok(true) => {
                    report.skipped_existing += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(title = %entry.title, error = %e, "existence check failed, skipping entry");
                    continue;
                }
            }

            let blocks = self.converter.convert(&entry.body_html);
            match self
                .store
                .create_document(&self.database_id, &entry, &blocks)
                .await
            {
                Ok(()) => {
                    report.created += 1;
                    info!(title = %entry.title, "document created");
                }
                Err(e) => {
                    error!(title = %entry.title, error = %e, "failed to create document");
                }
            }
        }

        Ok(())
    }

    async fn archive_stale(&self, now: NaiveDateTime, report: &mut SyncReport) {
        let cutoff = now - self.window;
        let ids = match self.store.stale_before(&self.database_id, cutoff).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "stale document query failed, skipping sweep");
                return;
            }
        };

        for id in ids {
            match self.store.archive(&id).await {
                Ok(()) => {
                    report.archived += 1;
                    info!(document_id = %id, "document archived");
                }
                Err(e) => {
                    error!(document_id = %id, error = %e, "failed to archive document");
                }
            }
        }
    }
}
