//! HTTP trigger.
//!
//! Any request to `/`, whatever the method, runs one invocation. A scheduler
//! only looks at the status: 200 when the check completed, 500 when it
//! aborted. Error details go to the log, not the response.
use axum::{
    extract::State,
    http::StatusCode,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::notify::Notifier;
use crate::pipeline::{Outcome, Pipeline};
use crate::storage::DedupStore;

pub fn router<S, N>(pipeline: Arc<Pipeline<S, N>>) -> Router
where
    S: DedupStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/", any(trigger::<S, N>))
        .route("/healthz", get(healthz))
        .with_state(pipeline)
}

/// Bind `0.0.0.0:<port>` and serve until the process is stopped.
pub async fn serve<S, N>(pipeline: Arc<Pipeline<S, N>>, port: u16) -> anyhow::Result<()>
where
    S: DedupStore + 'static,
    N: Notifier + 'static,
{
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Listening for check triggers");

    axum::serve(listener, router(pipeline).into_make_service()).await?;
    Ok(())
}

async fn trigger<S, N>(
    State(pipeline): State<Arc<Pipeline<S, N>>>,
) -> Result<String, (StatusCode, &'static str)>
where
    S: DedupStore + 'static,
    N: Notifier + 'static,
{
    match pipeline.run().await {
        Ok(Outcome::AlreadySeen { key }) => Ok(format!("already seen: {}", key)),
        Ok(Outcome::Recorded { key, .. }) => Ok(format!("recorded: {}", key)),
        Err(e) => {
            tracing::error!(stage = %e.stage(), error = %e, "Release notes check aborted");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}
