//! AI provider adapters.

mod http_provider;
mod mock_provider;

pub use http_provider::{HttpStagingProvider, StagingProviderConfig};
pub use mock_provider::{MockStagingProvider, MockStagingResponse};
