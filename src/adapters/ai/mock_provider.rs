//! Mock staging provider for testing.
//!
//! Configurable to return queued responses, simulate slow generations, or
//! inject errors, with call tracking for verification.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::staging::StagingStyle;
use crate::ports::{AiProvider, AiProviderError, StagedImage};

/// A configured mock response, consumed in order.
#[derive(Debug, Clone)]
pub enum MockStagingResponse {
    /// Return a successful generation.
    Success { image: Vec<u8>, cost_cents: i64 },
    /// Return a provider error.
    Error(String),
    /// Sleep long enough for the caller's deadline to fire.
    Hang,
}

/// Mock staging provider.
#[derive(Clone, Default)]
pub struct MockStagingProvider {
    responses: Arc<Mutex<VecDeque<MockStagingResponse>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<(String, String, StagingStyle)>>>,
}

impl MockStagingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn with_success(self, image: Vec<u8>, cost_cents: i64) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockStagingResponse::Success { image, cost_cents });
        self
    }

    /// Queues a provider error.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockStagingResponse::Error(message.into()));
        self
    }

    /// Queues a response that never arrives.
    pub fn with_hang(self) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockStagingResponse::Hang);
        self
    }

    /// Adds simulated latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Calls recorded so far, as (room_image_ref, prompt, style).
    pub fn calls(&self) -> Vec<(String, String, StagingStyle)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockStagingProvider {
    async fn stage(
        &self,
        room_image_ref: &str,
        prompt: &str,
        style: StagingStyle,
    ) -> Result<StagedImage, AiProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((room_image_ref.to_string(), prompt.to_string(), style));

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockStagingResponse::Success { image, cost_cents }) => {
                Ok(StagedImage { image, cost_cents })
            }
            Some(MockStagingResponse::Error(message)) => Err(AiProviderError::Provider(message)),
            Some(MockStagingResponse::Hang) => {
                sleep(Duration::from_secs(3600)).await;
                Err(AiProviderError::Provider("unreachable".to_string()))
            }
            None => Ok(StagedImage {
                image: b"staged-image".to_vec(),
                cost_cents: 40,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_queued_responses_in_order() {
        let provider = MockStagingProvider::new()
            .with_success(vec![1, 2], 10)
            .with_error("model overloaded");

        let first = provider
            .stage("uploads/a.jpg", "cozy", StagingStyle::Modern)
            .await
            .unwrap();
        assert_eq!(first.image, vec![1, 2]);
        assert_eq!(first.cost_cents, 10);

        let second = provider
            .stage("uploads/b.jpg", "cozy", StagingStyle::Modern)
            .await;
        assert!(matches!(second, Err(AiProviderError::Provider(_))));
    }

    #[tokio::test]
    async fn records_calls_for_verification() {
        let provider = MockStagingProvider::new();
        provider
            .stage("uploads/a.jpg", "beach house", StagingStyle::Coastal)
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "uploads/a.jpg");
        assert_eq!(calls[0].1, "beach house");
        assert_eq!(calls[0].2, StagingStyle::Coastal);
    }
}
