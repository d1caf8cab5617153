//! AiProvider port - the external staging model.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::staging::StagingStyle;

/// Result of a successful staging call.
#[derive(Debug, Clone)]
pub struct StagedImage {
    /// Generated image bytes.
    pub image: Vec<u8>,
    /// What the provider charged us for this generation, in cents.
    pub cost_cents: i64,
}

/// Errors from the AI provider.
#[derive(Debug, Clone, Error)]
pub enum AiProviderError {
    /// The provider returned an error response.
    #[error("provider error: {0}")]
    Provider(String),

    /// The call exceeded the configured deadline.
    #[error("provider call timed out after {0}s")]
    Timeout(u64),
}

/// Port for the AI staging service.
///
/// Calls may take tens of seconds. Implementations are invoked outside any
/// database transaction; the caller enforces the overall deadline.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generates a staged version of the room image at `room_image_ref`,
    /// guided by the caller's prompt and the selected furnishing style.
    async fn stage(
        &self,
        room_image_ref: &str,
        prompt: &str,
        style: StagingStyle,
    ) -> Result<StagedImage, AiProviderError>;
}
