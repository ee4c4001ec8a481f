//! Configuration for the release-notes watcher.
//!
//! Settings come from an optional TOML file, then environment overrides.
//! A missing file yields `Config::default()`, but `validate()` still refuses
//! to start without a webhook URL. The resolved `Config` is built once in
//! `main` and passed by reference; nothing below `main` reads the environment.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Cloud Run release notes, the feed this service was written for.
pub const DEFAULT_FEED_URL: &str = "https://cloud.google.com/feeds/run-release-notes.xml";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A required setting was not provided by the file or the environment.
    #[error("Missing required setting '{key}' (set {env} or add it to the config file)")]
    Missing { key: &'static str, env: &'static str },

    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Process-wide settings.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// Custom Debug impl masks `webhook_url`; the URL itself is the credential
/// for incoming webhooks.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listening port for the trigger endpoint.
    pub port: u16,

    /// Upstream release-notes feed.
    pub feed_url: String,

    /// Subject used at the start of every notification sentence.
    pub product_name: String,

    /// SQLite file holding dedup records (`:memory:` for tests).
    pub database_path: String,

    /// Record kind, the first half of every dedup key.
    pub record_kind: String,

    /// Outbound chat webhook. Required.
    pub webhook_url: Option<String>,

    pub fetch_timeout_secs: u64,

    pub notify_timeout_secs: u64,

    /// Upper bound on the feed body in bytes.
    pub max_feed_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            feed_url: DEFAULT_FEED_URL.to_string(),
            product_name: "Cloud Run".to_string(),
            database_path: "notewatch.db".to_string(),
            record_kind: "ReleaseNote".to_string(),
            webhook_url: None,
            fetch_timeout_secs: 30,
            notify_timeout_secs: 10,
            max_feed_bytes: 10 * 1024 * 1024,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("feed_url", &self.feed_url)
            .field("product_name", &self.product_name)
            .field("database_path", &self.database_path)
            .field("record_kind", &self.record_kind)
            .field(
                "webhook_url",
                &self.webhook_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("notify_timeout_secs", &self.notify_timeout_secs)
            .field("max_feed_bytes", &self.max_feed_bytes)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "port",
        "feed_url",
        "product_name",
        "database_path",
        "record_kind",
        "webhook_url",
        "fetch_timeout_secs",
        "notify_timeout_secs",
        "max_feed_bytes",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text. Blank text yields defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production and a map in tests.
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "port",
                reason: format!("'{}' is not a valid port number", port),
            })?;
        }
        if let Some(v) = get("FEED_URL") {
            self.feed_url = v;
        }
        if let Some(v) = get("PRODUCT_NAME") {
            self.product_name = v;
        }
        if let Some(v) = get("DATABASE_PATH") {
            self.database_path = v;
        }
        if let Some(v) = get("RECORD_KIND") {
            self.record_kind = v;
        }
        if let Some(v) = get("SLACK_URL") {
            self.webhook_url = Some(v);
        }
        Ok(())
    }

    /// Check that every required setting is present and usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let webhook = self
            .webhook_url
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing {
                key: "webhook_url",
                env: "SLACK_URL",
            })?;

        check_http_url("feed_url", &self.feed_url)?;
        check_http_url("webhook_url", webhook)?;

        if self.record_kind.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "record_kind",
                reason: "must not be empty".to_string(),
            });
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.fetch_timeout_secs == 0 || self.notify_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout",
                reason: "timeouts must be at least one second".to_string(),
            });
        }
        if self.max_feed_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_feed_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

fn check_http_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
