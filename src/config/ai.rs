//! AI staging provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI staging provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Provider API key
    pub api_key: String,

    /// Provider base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call deadline in seconds. A call past the deadline is abandoned
    /// and the job fails with the credit refunded.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get the provider deadline as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate AI provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("AI_API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidProviderUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidProviderTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.stagespark.example".to_string()
}

fn default_timeout() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_invalid() {
        let config = AiConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_http_base_url_is_invalid() {
        let config = AiConfig {
            api_key: "sk-stage-xxx".to_string(),
            base_url: "ftp://provider.example".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = AiConfig {
            api_key: "sk-stage-xxx".to_string(),
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn typical_config_is_valid() {
        let config = AiConfig {
            api_key: "sk-stage-xxx".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }
}
