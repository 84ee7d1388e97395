//! Configuration for gate runs
//!
//! Wraps the gate rules with the run-level limits: the per-run deadline
//! and how many articles a batch validates at once.

use factgate_gatekeeper::GateConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the orchestrator
///
/// # Examples
///
/// ```
/// use factgate_orchestrator::OrchestratorConfig;
///
/// let config = OrchestratorConfig::default();
/// assert_eq!(config.timeout_ms, 10_000);
///
/// let config = OrchestratorConfig::strict();
/// assert_eq!(config.timeout_ms, 5_000);
///
/// let config = OrchestratorConfig::lenient();
/// assert_eq!(config.timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Deadline for one article, covering every gate (in milliseconds)
    /// Default: 10 000
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Articles validated at once by `run_batch`
    /// Default: 4
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Gate rules
    #[serde(default)]
    pub gates: GateConfig,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_batch_concurrency() -> usize {
    4
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            batch_concurrency: default_batch_concurrency(),
            gates: GateConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Strict gate rules with a short deadline
    pub fn strict() -> Self {
        Self {
            timeout_ms: 5_000,
            batch_concurrency: default_batch_concurrency(),
            gates: GateConfig::strict(),
        }
    }

    /// Lenient gate rules with a long deadline
    pub fn lenient() -> Self {
        Self {
            timeout_ms: 30_000,
            batch_concurrency: default_batch_concurrency(),
            gates: GateConfig::lenient(),
        }
    }

    /// Get the run deadline as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the run limits and every gate rule
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than zero".to_string());
        }
        if self.batch_concurrency == 0 {
            return Err("batch_concurrency must be greater than zero".to_string());
        }
        self.gates.validate()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.batch_concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_carry_gate_presets() {
        let strict = OrchestratorConfig::strict();
        let lenient = OrchestratorConfig::lenient();
        assert!(strict.timeout_ms < lenient.timeout_ms);
        assert!(strict.gates.traceability.rounding_epsilon < lenient.gates.traceability.rounding_epsilon);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = OrchestratorConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = OrchestratorConfig::from_toml(
            r#"
            timeout_ms = 2500

            [gates.traceability]
            rounding_epsilon = 0.002
            "#,
        )
        .unwrap();
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.batch_concurrency, 4);
        assert_eq!(config.gates.traceability.rounding_epsilon, 0.002);
        assert_eq!(config.gates.structural.min_public_chars, 200);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = OrchestratorConfig::strict();
        let text = config.to_toml().unwrap();
        let parsed = OrchestratorConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.timeout_ms, config.timeout_ms);
        assert_eq!(parsed.gates.attribution.marker_window_chars, config.gates.attribution.marker_window_chars);
    }
}
