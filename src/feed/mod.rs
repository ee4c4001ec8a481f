//! Release-notes feed retrieval and decoding.
//!
//! - [`fetcher`] - One bounded HTTP GET of the configured feed URL
//! - [`parser`] - Atom/RSS decoding via `feed-rs` into [`Feed`] / [`FeedEntry`]
//!
//! Neither submodule retries: a failed fetch or parse aborts the current
//! invocation and the external scheduler tries again later.

mod fetcher;
mod parser;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, EmptyFeed, Feed, FeedEntry, ParseError};
