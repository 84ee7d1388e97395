//! Configuration for the Number Extractor

use serde::{Deserialize, Serialize};

/// Configuration for the Number Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Bare integers at or below this value need no traceability
    pub safe_integer_max: u64,

    /// Further bare integers that need no traceability (index names, round figures)
    pub safe_integers: Vec<u64>,

    /// Characters of context captured on each side of a token
    pub context_chars: usize,

    /// Lowest four-digit value treated as a calendar year
    pub year_min: u64,

    /// Highest four-digit value treated as a calendar year
    pub year_max: u64,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.context_chars > 500 {
            return Err("context_chars cannot exceed 500".to_string());
        }
        if self.year_min >= self.year_max {
            return Err("year_min must be less than year_max".to_string());
        }
        if self.year_min < 1000 || self.year_max > 9999 {
            return Err("year range must stay within four digits".to_string());
        }
        Ok(())
    }

    /// Whether a bare integer is exempt
    pub fn is_safe_integer(&self, value: u64) -> bool {
        value <= self.safe_integer_max || self.safe_integers.contains(&value)
    }
}

impl Default for ExtractorConfig {
    /// Default configuration: small counts and round index figures are exempt
    fn default() -> Self {
        Self {
            safe_integer_max: 20,
            safe_integers: vec![100, 200, 300, 400, 500],
            context_chars: 40,
            year_min: 1900,
            year_max: 2100,
        }
    }
}

impl ExtractorConfig {
    /// Strict preset: only single-digit counts are exempt
    pub fn strict() -> Self {
        Self {
            safe_integer_max: 9,
            safe_integers: Vec::new(),
            ..Self::default()
        }
    }

    /// Lenient preset: day-of-month counts and more round figures are exempt
    pub fn lenient() -> Self {
        Self {
            safe_integer_max: 31,
            safe_integers: vec![50, 100, 200, 300, 400, 500, 1000],
            context_chars: 60,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
