use chrono::{DateTime, Utc};
use feed_rs::parser;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Malformed feed document: {0}")]
pub struct ParseError(String);

/// The feed decoded fine but carried no entries.
#[derive(Debug, Error)]
#[error("Feed contains no entries")]
pub struct EmptyFeed;

/// One release-notes entry.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// Upstream entry id, e.g. `https://.../run-release-notes.xml#June_15_2020`
    pub identity: String,
    pub title: String,
    /// `updated`, falling back to `published`
    pub published_at: Option<DateTime<Utc>>,
    pub link: Option<String>,
    /// Entry body, usually escaped HTML in the source document
    pub content_body: String,
    pub content_type: String,
}

impl FeedEntry {
    /// Key under which this entry is recorded once announced.
    ///
    /// Upstream ids share the feed URL and differ only in the fragment, which
    /// names the release date. The segment after the first `#` (up to any
    /// second `#`) is the key when present; otherwise the whole id; otherwise
    /// a digest of link, title and timestamp.
    pub fn dedup_key(&self) -> String {
        let id = self.identity.trim();
        if let Some(fragment) = id.split('#').nth(1) {
            let fragment = fragment.trim();
            if !fragment.is_empty() {
                return fragment.to_string();
            }
        }
        if !id.is_empty() {
            return id.to_string();
        }

        let input = format!(
            "{}|{}|{}",
            self.link.as_deref().unwrap_or(""),
            self.title,
            self.published_at
                .map(|p| p.timestamp().to_string())
                .unwrap_or_default()
        );
        let hash = Sha256::digest(input.as_bytes());
        format!("{:x}", hash)
    }
}

/// A decoded feed. `entries` keeps document order, newest first by convention.
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub entries: Vec<FeedEntry>,
}

impl Feed {
    /// The most recent entry, the only one an invocation ever looks at.
    pub fn latest(&self) -> Result<&FeedEntry, EmptyFeed> {
        self.entries.first().ok_or(EmptyFeed)
    }
}

pub fn parse_feed(bytes: &[u8]) -> Result<Feed, ParseError> {
    let feed = parser::parse(bytes).map_err(|e| ParseError(e.to_string()))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone());
            let published_at = entry.updated.or(entry.published);
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            // Prefer <content>; RSS items only carry a description/summary
            let (content_body, content_type) = match entry.content {
                Some(content) => (
                    content.body.unwrap_or_default(),
                    content.content_type.to_string(),
                ),
                None => match entry.summary {
                    Some(summary) => (summary.content, summary.content_type.to_string()),
                    None => (String::new(), "text/plain".to_string()),
                },
            };

            FeedEntry {
                identity: entry.id,
                title,
                published_at,
                link,
                content_body,
                content_type,
            }
        })
        .collect();

    Ok(Feed {
        id: feed.id,
        title: feed.title.map(|t| t.content),
        link: feed.links.first().map(|l| l.href.clone()),
        author: feed.authors.first().map(|p| p.name.clone()),
        updated: feed.updated,
        entries,
    })
}
