//! One invocation of the release-notes check.
//!
//! ```text
//! Fetching → Parsing → CheckingDedup ─┬→ AlreadySeen ─→ Done
//!                                     └→ Notifying  ─→ Done
//! (any stage) → Aborted
//! ```
//!
//! Notification happens before the record is written. A crash between the
//! two means the next invocation notifies again; a notification is never
//! silently lost. Two overlapping invocations can both notify for the same
//! new entry; the create-if-absent write keeps a single record and the loser
//! logs the race.
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::classify::{classify, compose};
use crate::config::Config;
use crate::feed::{fetch_feed, parse_feed, EmptyFeed, FetchError, ParseError};
use crate::notify::Notifier;
use crate::storage::{DedupRecord, DedupStore, PutOutcome, StoreError};

/// Pipeline stages, used in logs and to locate an abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Parsing,
    CheckingDedup,
    Notifying,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::CheckingDedup => "checking_dedup",
            Stage::Notifying => "notifying",
        };
        f.write_str(name)
    }
}

/// Reasons an invocation ends in `Aborted`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch feed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to parse feed: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    EmptyFeed(#[from] EmptyFeed),
    /// The store failed during `stage`; nothing was recorded
    #[error("Dedup store failed while {stage}: {source}")]
    Store {
        stage: Stage,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    /// The stage the invocation was in when it aborted
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Fetch(_) => Stage::Fetching,
            PipelineError::Parse(_) | PipelineError::EmptyFeed(_) => Stage::Parsing,
            PipelineError::Store { stage, .. } => *stage,
        }
    }
}

/// How a successful invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The latest entry already has a record. Nothing was sent or written.
    AlreadySeen { key: String },
    /// The latest entry was new and is now recorded.
    Recorded {
        key: String,
        /// Composed summary; empty when no category marker matched
        message: String,
        /// True only when a non-empty message reached the channel
        notified: bool,
        /// False when a concurrent invocation wrote the record first
        created: bool,
    },
}

impl Outcome {
    pub fn key(&self) -> &str {
        match self {
            Outcome::AlreadySeen { key } | Outcome::Recorded { key, .. } => key,
        }
    }
}

/// Per-invocation settings, copied out of [`Config`] once at startup.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub feed_url: String,
    pub product_name: String,
    pub fetch_timeout: Duration,
    pub max_feed_bytes: usize,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            feed_url: config.feed_url.clone(),
            product_name: config.product_name.clone(),
            fetch_timeout: config.fetch_timeout(),
            max_feed_bytes: config.max_feed_bytes,
        }
    }
}

/// The orchestrator. Holds no state between invocations beyond its handles.
pub struct Pipeline<S, N> {
    settings: PipelineSettings,
    client: reqwest::Client,
    store: S,
    notifier: N,
}

impl<S, N> Pipeline<S, N>
where
    S: DedupStore,
    N: Notifier,
{
    pub fn new(settings: PipelineSettings, client: reqwest::Client, store: S, notifier: N) -> Self {
        Self {
            settings,
            client,
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one invocation end to end.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] means the invocation aborted. A fetch, parse or
    /// existence-check failure guarantees nothing was sent and nothing was
    /// written. A failed send is not an error.
    pub async fn run(&self) -> Result<Outcome, PipelineError> {
        let settings = &self.settings;

        tracing::debug!(stage = %Stage::Fetching, feed = %settings.feed_url, "Fetching feed");
        let bytes = fetch_feed(
            &self.client,
            &settings.feed_url,
            settings.fetch_timeout,
            settings.max_feed_bytes,
        )
        .await?;

        tracing::debug!(stage = %Stage::Parsing, bytes = bytes.len(), "Parsing feed");
        let feed = parse_feed(&bytes)?;
        let latest = feed.latest()?;
        let key = latest.dedup_key();

        tracing::debug!(stage = %Stage::CheckingDedup, key = %key, entries = feed.entries.len(), "Checking dedup store");
        let seen = self
            .store
            .exists(&key)
            .await
            .map_err(|source| PipelineError::Store {
                stage: Stage::CheckingDedup,
                source,
            })?;

        if seen {
            tracing::info!(key = %key, "No new release notes since last check");
            return Ok(Outcome::AlreadySeen { key });
        }

        let counts = classify(&latest.content_body);
        let message = compose(&settings.product_name, &counts);

        let notified = if message.is_empty() {
            tracing::info!(key = %key, title = %latest.title, "New entry has no categorized changes, not notifying");
            false
        } else {
            tracing::info!(stage = %Stage::Notifying, key = %key, message = %message, "New release notes");
            match self.notifier.send(&message).await {
                Ok(()) => true,
                Err(e) => {
                    // Dedup stays authoritative; the entry is still recorded
                    tracing::warn!(key = %key, error = %e, "Failed to send notification");
                    false
                }
            }
        };

        let record = DedupRecord::from(latest);
        let outcome = self
            .store
            .put(&key, &record)
            .await
            .map_err(|source| PipelineError::Store {
                stage: Stage::Notifying,
                source,
            })?;

        if outcome == PutOutcome::AlreadyPresent {
            tracing::warn!(key = %key, "Entry was recorded by a concurrent invocation");
        }

        Ok(Outcome::Recorded {
            key,
            message,
            notified,
            created: outcome == PutOutcome::Created,
        })
    }
}
