use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pylon_domain::{
    DomainError, DomainResult, RegistrationClient, RegistrationRequest, RegistrationResponse,
};
use reqwest::StatusCode;
use tracing::{debug, info};

const REGISTRATION_PATH: &str = "/v1/registration";

/// HTTP client for the one-time registration handshake.
pub struct HttpRegistrationClient {
    http: reqwest::Client,
    registration_url: String,
}

impl HttpRegistrationClient {
    pub fn new(ingress_address: &str, timeout: Duration) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            registration_url: format!(
                "{}{}",
                ingress_address.trim_end_matches('/'),
                REGISTRATION_PATH
            ),
        })
    }
}

#[async_trait]
impl RegistrationClient for HttpRegistrationClient {
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> DomainResult<RegistrationResponse> {
        debug!(url = %self.registration_url, "sending registration request");

        let response = self
            .http
            .post(&self.registration_url)
            .json(request)
            .send()
            .await
            .context("registration request failed")?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::RegistrationRejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RegistrationResponse = response
            .json()
            .await
            .context("failed to decode registration response")?;

        info!("registration accepted");
        Ok(parsed)
    }
}
