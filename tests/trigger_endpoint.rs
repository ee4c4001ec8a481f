//! Integration tests for the HTTP trigger: status codes per outcome.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use notewatch::notify::WebhookNotifier;
use notewatch::pipeline::{Pipeline, PipelineSettings};
use notewatch::server::router;
use notewatch::storage::{Database, DedupStore};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>https://cloud.google.com/feeds/run-release-notes.xml</id>
  <title>Cloud Run - Release notes</title>
  <entry>
    <title>June 15, 2020</title>
    <id>https://cloud.google.com/feeds/run-release-notes.xml#June_15_2020</id>
    <updated>2020-06-15T00:00:00-07:00</updated>
    <content type="html">&lt;h3&gt;Feature&lt;/h3&gt;</content>
  </entry>
</feed>"#;

async fn pipeline_for(
    feed_status: u16,
    db: Database,
) -> (MockServer, Arc<Pipeline<Database, WebhookNotifier>>) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(feed_status).set_body_string(FEED))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let settings = PipelineSettings {
        feed_url: format!("{}/feed.xml", server.uri()),
        product_name: "Cloud Run".to_string(),
        fetch_timeout: Duration::from_secs(5),
        max_feed_bytes: 1024 * 1024,
    };
    let notifier = WebhookNotifier::new(
        client.clone(),
        format!("{}/hook", server.uri()),
        Duration::from_secs(5),
    );
    let pipeline = Arc::new(Pipeline::new(settings, client, db, notifier));
    (server, pipeline)
}

async fn call(
    pipeline: Arc<Pipeline<Database, WebhookNotifier>>,
    method: &str,
    uri: &str,
) -> (StatusCode, String) {
    let response = router(pipeline)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_new_entry_then_already_seen() {
    let db = Database::open(":memory:", "ReleaseNote").await.unwrap();
    let (_server, pipeline) = pipeline_for(200, db.clone()).await;

    let (status, body) = call(pipeline.clone(), "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "recorded: June_15_2020");
    assert!(db.exists("June_15_2020").await.unwrap());

    let (status, body) = call(pipeline, "POST", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "already seen: June_15_2020");
}

#[tokio::test]
async fn test_upstream_failure_is_server_error() {
    let db = Database::open(":memory:", "ReleaseNote").await.unwrap();
    let (_server, pipeline) = pipeline_for(500, db.clone()).await;

    let (status, body) = call(pipeline, "GET", "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
    assert_eq!(db.count_records().await.unwrap(), 0);
}

#[tokio::test]
async fn test_healthz_does_not_run_check() {
    let db = Database::open(":memory:", "ReleaseNote").await.unwrap();
    let (server, pipeline) = pipeline_for(200, db.clone()).await;

    let (status, body) = call(pipeline, "GET", "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(db.count_records().await.unwrap(), 0);
}
