//! notewatch: announce each new vendor release-notes entry exactly once.
//!
//! Each invocation fetches the feed, looks at the newest entry, and if the
//! dedup store has no record of it, sends a one-line summary to a chat
//! webhook and records the entry.
//!
//! - [`feed`] - Fetching and parsing the Atom/RSS document
//! - [`classify`] - Category counting and message composition
//! - [`storage`] - SQLite dedup store
//! - [`notify`] - Webhook notification channel
//! - [`pipeline`] - The per-invocation orchestrator
//! - [`server`] - HTTP trigger endpoint
//! - [`config`] - Startup configuration

pub mod classify;
pub mod config;
pub mod feed;
pub mod notify;
pub mod pipeline;
pub mod server;
pub mod storage;
