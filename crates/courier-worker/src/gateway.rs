// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP delivery client for per-session worker instances.
//!
//! Posts a send request to the worker's resolved base URL and classifies
//! the outcome. Retry policy belongs to the dispatcher, which currently has
//! none: a failed send is terminal.

use std::time::Duration;

use async_trait::async_trait;
use courier_config::model::{DeliveryConfig, WorkerConfig};
use courier_core::{CourierError, WorkerGateway};
use tracing::debug;

use crate::address::resolve_base_url;

/// How much of an error response body is preserved in the error text.
const ERROR_BODY_LIMIT: usize = 512;

/// Reqwest-backed [`WorkerGateway`].
#[derive(Debug, Clone)]
pub struct HttpWorkerGateway {
    client: reqwest::Client,
    worker: WorkerConfig,
    base_url_override: Option<String>,
}

impl HttpWorkerGateway {
    /// Create the client with the configured per-request timeout.
    pub fn new(
        worker: WorkerConfig,
        delivery: &DeliveryConfig,
    ) -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(delivery.timeout_secs))
            .build()
            .map_err(|e| CourierError::Gateway {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            worker,
            base_url_override: None,
        })
    }

    /// Overrides address resolution (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url_override = Some(url);
        self
    }

    fn base_url(&self, session_id: &str) -> String {
        match &self.base_url_override {
            Some(url) => url.clone(),
            None => resolve_base_url(&self.worker, session_id),
        }
    }

    /// Probe the worker's readiness endpoint. Ok iff it answers 200.
    pub async fn health(&self, session_id: &str) -> Result<(), CourierError> {
        let url = format!("{}/health", self.base_url(session_id));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CourierError::Gateway {
                message: format!("worker unreachable: {e}"),
                source: Some(Box::new(e)),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CourierError::Gateway {
                message: format!("worker health returned {}", response.status()),
                source: None,
            })
        }
    }
}

#[async_trait]
impl WorkerGateway for HttpWorkerGateway {
    async fn send(
        &self,
        session_id: &str,
        recipient: &str,
        payload: &str,
    ) -> Result<(), CourierError> {
        let url = format!("{}/send-message", self.base_url(session_id));
        let body = serde_json::json!({
            "session_id": session_id,
            "phone": recipient,
            "message": payload,
            "reply": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CourierError::Gateway {
                message: format!("worker unavailable: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            debug!(session_id, recipient, "message accepted by worker");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            body = body.chars().take(ERROR_BODY_LIMIT).collect();
        }
        Err(CourierError::Gateway {
            message: format!("worker returned {}: {body}", status.as_u16()),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_gateway(base: String) -> HttpWorkerGateway {
        HttpWorkerGateway::new(WorkerConfig::default(), &DeliveryConfig::default())
            .unwrap()
            .with_base_url(base)
    }

    #[tokio::test]
    async fn send_posts_expected_body_and_succeeds_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-message"))
            .and(body_partial_json(serde_json::json!({
                "session_id": "wk-abc",
                "phone": "+15550001",
                "message": "hello",
                "reply": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = make_gateway(server.uri());
        gateway.send("wk-abc", "+15550001", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn non_200_is_a_failure_carrying_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-message"))
            .respond_with(ResponseTemplate::new(500).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = make_gateway(server.uri());
        let err = gateway.send("wk-abc", "+15550001", "hello").await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("nope"));
    }

    #[tokio::test]
    async fn send_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-message"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1) // a second attempt would trip the expectation
            .mount(&server)
            .await;

        let gateway = make_gateway(server.uri());
        assert!(gateway.send("wk-abc", "+15550001", "hello").await.is_err());
    }

    #[tokio::test]
    async fn transport_error_is_classified_as_gateway_failure() {
        // Nothing is listening on this port.
        let gateway = make_gateway("http://127.0.0.1:1".to_string());
        let err = gateway.send("wk-abc", "+15550001", "hello").await.unwrap_err();
        assert!(matches!(err, CourierError::Gateway { .. }));
    }

    #[tokio::test]
    async fn health_checks_the_health_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let gateway = make_gateway(server.uri());
        gateway.health("wk-abc").await.unwrap();
    }
}
