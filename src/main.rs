use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use notewatch::config::Config;
use notewatch::notify::WebhookNotifier;
use notewatch::pipeline::{Outcome, Pipeline, PipelineSettings};
use notewatch::server;
use notewatch::storage::Database;

#[derive(Parser, Debug)]
#[command(
    name = "notewatch",
    about = "Announce new release-notes entries to a chat webhook"
)]
struct Args {
    /// TOML config file (optional; environment variables override it)
    #[arg(long, value_name = "FILE", default_value = "notewatch.toml")]
    config: PathBuf,

    /// Run a single check and exit instead of serving HTTP
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    config
        .apply_env(|name| std::env::var(name).ok())
        .context("Invalid environment configuration")?;
    config.validate().context("Refusing to start")?;
    tracing::debug!(config = ?config, "Resolved configuration");

    let db = Database::open(&config.database_path, &config.record_kind)
        .await
        .with_context(|| format!("Failed to open dedup store at {}", config.database_path))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("notewatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    // validate() guarantees the webhook is present
    let webhook_url = config.webhook_url.clone().unwrap_or_default();
    let notifier = WebhookNotifier::new(client.clone(), webhook_url, config.notify_timeout());

    let pipeline = Arc::new(Pipeline::new(
        PipelineSettings::from(&config),
        client,
        db,
        notifier,
    ));

    if args.once {
        let outcome = pipeline.run().await.context("Release notes check aborted")?;
        match outcome {
            Outcome::AlreadySeen { key } => println!("already seen: {}", key),
            Outcome::Recorded { key, message, .. } if message.is_empty() => {
                println!("recorded: {} (nothing to announce)", key)
            }
            Outcome::Recorded { key, message, .. } => println!("recorded: {}: {}", key, message),
        }
        return Ok(());
    }

    server::serve(pipeline, config.port).await
}
