//! HTTP implementation of the AiProvider port.
//!
//! Talks to the staging model's REST API: one POST per generation, image
//! bytes returned base64-encoded in the JSON response alongside the metered
//! cost. Network-level timeouts live on the client; the orchestrator applies
//! the overall deadline on top.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::staging::StagingStyle;
use crate::ports::{AiProvider, AiProviderError, StagedImage};

/// Configuration for the staging provider.
#[derive(Debug, Clone)]
pub struct StagingProviderConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl StagingProviderConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: base_url.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// HTTP staging provider.
pub struct HttpStagingProvider {
    config: StagingProviderConfig,
    client: Client,
}

impl HttpStagingProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: StagingProviderConfig) -> Result<Self, AiProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiProviderError::Provider(format!("failed to build client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn stage_url(&self) -> String {
        format!("{}/v1/stage", self.config.base_url)
    }
}

#[derive(Debug, Serialize)]
struct StageRequest<'a> {
    image_url: &'a str,
    style: &'a str,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct StageResponse {
    image_base64: String,
    cost_cents: i64,
}

/// Default instruction when the caller supplied no prompt of their own.
fn prompt_for(style: StagingStyle) -> String {
    format!(
        "Virtually stage this empty room with {} furniture and decor. \
         Keep walls, windows, and flooring unchanged.",
        style.as_str()
    )
}

#[async_trait]
impl AiProvider for HttpStagingProvider {
    async fn stage(
        &self,
        room_image_ref: &str,
        prompt: &str,
        style: StagingStyle,
    ) -> Result<StagedImage, AiProviderError> {
        let prompt = if prompt.trim().is_empty() {
            prompt_for(style)
        } else {
            prompt.to_string()
        };
        let request = StageRequest {
            image_url: room_image_ref,
            style: style.as_str(),
            prompt,
        };

        let response = self
            .client
            .post(self.stage_url())
            .bearer_auth(self.config.api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiProviderError::Timeout(self.config.timeout.as_secs())
                } else {
                    AiProviderError::Provider(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiProviderError::Provider(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let body: StageResponse = response
            .json()
            .await
            .map_err(|e| AiProviderError::Provider(format!("invalid response body: {}", e)))?;

        let image = BASE64
            .decode(&body.image_base64)
            .map_err(|e| AiProviderError::Provider(format!("invalid image encoding: {}", e)))?;

        Ok(StagedImage {
            image,
            cost_cents: body.cost_cents,
        })
    }
}
