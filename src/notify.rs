//! Outbound notification channel.
//!
//! The pipeline only needs `send(message)`. Delivery is best effort: the
//! caller logs a [`NotifyError`] and carries on.
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Carries no URL; the webhook URL is the credential
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    #[error("HTTP error: status {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Posts `{"text": message}` to an incoming-webhook URL (Slack format).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: SecretString,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: SecretString::from(url.into()),
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let payload = json!({ "text": message });

        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(self.url.expose_secret())
                .header("Content-Type", "application/json")
                .body(payload.to_string())
                .send(),
        )
        .await
        .map_err(|_| NotifyError::Timeout(self.timeout))?
        .map_err(|e| NotifyError::Network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            // Webhook error bodies are short ("invalid_payload", "no_text")
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_text_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/T000/B000"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({ "text": "Cloud Run has 1 new fix" })))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = WebhookNotifier::new(
            reqwest::Client::new(),
            format!("{}/services/T000/B000", mock_server.uri()),
            Duration::from_secs(5),
        );
        notifier.send("Cloud Run has 1 new fix").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_non_success_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_payload"))
            .mount(&mock_server)
            .await;

        let notifier = WebhookNotifier::new(
            reqwest::Client::new(),
            mock_server.uri(),
            Duration::from_secs(5),
        );
        let err = notifier.send("hello").await.unwrap_err();
        match err {
            NotifyError::HttpStatus { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid_payload");
            }
            e => panic!("Expected HttpStatus, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_network_error_does_not_expose_webhook_url() {
        // Reserve a port, then free it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let notifier = WebhookNotifier::new(
            reqwest::Client::new(),
            format!("http://127.0.0.1:{}/services/T000/B000/SECRET-TOKEN", port),
            Duration::from_secs(5),
        );
        let err = notifier.send("hello").await.unwrap_err();

        assert!(matches!(err, NotifyError::Network(_)), "got {:?}", err);
        let logged = format!("{} {:?}", err, err);
        assert!(!logged.contains("SECRET-TOKEN"), "leaked: {}", logged);
        assert!(!logged.contains("/services/"), "leaked: {}", logged);
    }

    #[tokio::test]
    async fn test_send_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let notifier = WebhookNotifier::new(
            reqwest::Client::new(),
            mock_server.uri(),
            Duration::from_millis(100),
        );
        let err = notifier.send("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Timeout(_)));
    }
}
