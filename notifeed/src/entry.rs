use chrono::NaiveDateTime;
use feed_rs::model::Entry;
use thiserror::Error;
use url::Url;

/// Placeholder author when the feed omits one.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Whether the body came from the feed's full content or its summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    FullArticle,
    SummaryOnly,
}

impl BodyKind {
    /// Label used for the remote "Content Type" select property.
    pub fn label(&self) -> &'static str {
        match self {
            BodyKind::FullArticle => "Full article",
            BodyKind::SummaryOnly => "Only summary",
        }
    }
}

/// Why an entry was excluded from a run.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("entry has no title")]
    NoTitle,
    #[error("entry has no link")]
    NoLink,
    #[error("entry link is not a valid URL: {0}")]
    BadLink(#[from] url::ParseError),
    #[error("entry has no parseable publication date")]
    BadDate,
    #[error("entry has neither content nor summary")]
    NoBody,
}

/// Uniform per-entry record extracted from a raw feed entry.
#[derive(Debug, Clone)]
pub struct NormalizedEntry {
    pub title: String,
    pub author: String,
    pub tag: String,
    pub published_at: NaiveDateTime,
    pub link: Url,
    pub body_html: String,
    pub body_kind: BodyKind,
}

impl NormalizedEntry {
    /// Canonical `YYYY-MM-DD HH:MM:SS` form of the publication date.
    pub fn published_canonical(&self) -> String {
        self.published_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Extract a `NormalizedEntry`, tolerating missing optional fields.
///
/// The title is the identity the remote store is deduplicated on, so it is
/// kept verbatim, and an entry without one is rejected. Dates come out of the
/// feed parser already normalized to UTC; the offset is dropped from there.
pub fn normalize(entry: &Entry, tag: &str) -> Result<NormalizedEntry, SkipReason> {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .filter(|t| !t.is_empty())
        .ok_or(SkipReason::NoTitle)?;

    let href = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .ok_or(SkipReason::NoLink)?;
    let link = Url::parse(&href)?;

    // Atom feeds without <published> still carry <updated>.
    let published_at = entry
        .published
        .or(entry.updated)
        .ok_or(SkipReason::BadDate)?
        .naive_utc();

    let author = entry
        .authors
        .first()
        .map(|p| p.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let (body_html, body_kind) = if let Some(body) = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .filter(|b| !b.is_empty())
    {
        (body, BodyKind::FullArticle)
    } else if let Some(summary) = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .filter(|s| !s.is_empty())
    {
        (summary, BodyKind::SummaryOnly)
    } else {
        return Err(SkipReason::NoBody);
    };

    Ok(NormalizedEntry {
        title,
        author,
        tag: tag.to_string(),
        published_at,
        link,
        body_html,
        body_kind,
    })
}
