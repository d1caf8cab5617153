//! Staging styles offered to users.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::StagingError;

/// Furnishing style applied by the AI provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingStyle {
    Modern,
    Scandinavian,
    Industrial,
    Coastal,
    Traditional,
    Minimalist,
}

impl StagingStyle {
    /// All supported styles, for validation messages and docs.
    pub fn all() -> &'static [StagingStyle] {
        &[
            StagingStyle::Modern,
            StagingStyle::Scandinavian,
            StagingStyle::Industrial,
            StagingStyle::Coastal,
            StagingStyle::Traditional,
            StagingStyle::Minimalist,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StagingStyle::Modern => "modern",
            StagingStyle::Scandinavian => "scandinavian",
            StagingStyle::Industrial => "industrial",
            StagingStyle::Coastal => "coastal",
            StagingStyle::Traditional => "traditional",
            StagingStyle::Minimalist => "minimalist",
        }
    }
}

impl fmt::Display for StagingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StagingStyle {
    type Err = StagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modern" => Ok(StagingStyle::Modern),
            "scandinavian" => Ok(StagingStyle::Scandinavian),
            "industrial" => Ok(StagingStyle::Industrial),
            "coastal" => Ok(StagingStyle::Coastal),
            "traditional" => Ok(StagingStyle::Traditional),
            "minimalist" => Ok(StagingStyle::Minimalist),
            other => Err(StagingError::validation(
                "style",
                format!("unknown staging style '{}'", other),
            )),
        }
    }
}
