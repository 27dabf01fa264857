use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pylon_domain::{DomainResult, EventSink, ForwardReceipt};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

const EVENTS_PATH: &str = "/v1/iot/events";

/// Delivers normalized events to the ingestion endpoint, authenticated as
/// the bearer of the registration credential.
pub struct HttpEventSink {
    http: reqwest::Client,
    events_url: String,
    token: String,
}

impl HttpEventSink {
    pub fn new(ingress_address: &str, token: String, timeout: Duration) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            events_url: format!("{}{}", ingress_address.trim_end_matches('/'), EVENTS_PATH),
            token,
        })
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn forward(&self, payload: Vec<u8>) -> DomainResult<ForwardReceipt> {
        debug!(url = %self.events_url, bytes = payload.len(), "posting event");

        let response = self
            .http
            .post(&self.events_url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.token)
            .body(payload)
            .send()
            .await
            .context("event delivery failed")?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) if text.is_empty() => None,
            Ok(text) => Some(text),
            Err(_) => None,
        };

        Ok(ForwardReceipt { status, body })
    }
}
