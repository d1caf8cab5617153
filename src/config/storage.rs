//! Object storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Object storage configuration (staged image artifacts)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored artifacts
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.root.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE_ROOT"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./data/staged")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_set() {
        let config = StorageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.root, PathBuf::from("./data/staged"));
    }

    #[test]
    fn empty_root_is_invalid() {
        let config = StorageConfig {
            root: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }
}
