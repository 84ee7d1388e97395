//! The gate set

use crate::allowlist::TraceabilityGate;
use crate::attribution::AttributionGate;
use crate::compliance::ComplianceGate;
use crate::consistency::ConsistencyGate;
use crate::gate::{incomplete_outcome, Gate};
use crate::structural::{BilingualGate, PaywallGate, SectionsGate, SourcesGate};
use crate::{GateConfig, GatekeeperError};
use factgate_domain::{Document, FactLookup, GateName, GateOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

/// The Gatekeeper holds every document gate, built once from one configuration
pub struct Gatekeeper {
    config: GateConfig,
    gates: Vec<Arc<dyn Gate>>,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    ///
    /// Fails when the configuration is invalid or a configured pattern does
    /// not compile.
    pub fn new(config: GateConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;

        let gates: Vec<Arc<dyn Gate>> = vec![
            Arc::new(TraceabilityGate::new(config.extraction.clone(), config.traceability.clone())?),
            Arc::new(AttributionGate::new(&config.attribution)?),
            Arc::new(ConsistencyGate::new(config.extraction.clone(), config.consistency.clone())?),
            Arc::new(PaywallGate::new(&config.structural)),
            Arc::new(SectionsGate::new(&config.structural)),
            Arc::new(SourcesGate::new(&config.structural)),
            Arc::new(BilingualGate::new(&config.structural, &config.consistency.entity_stopwords)),
            Arc::new(ComplianceGate::new(&config.compliance)?),
        ];
        debug!(gates = gates.len(), "Gatekeeper ready");

        Ok(Self { config, gates })
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Result<Self, GatekeeperError> {
        Self::new(GateConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Every gate, in report order
    pub fn gates(&self) -> &[Arc<dyn Gate>] {
        &self.gates
    }

    /// Run every gate in turn
    ///
    /// A gate that errors yields an incomplete outcome; the others still run.
    pub fn check(&self, document: &Document, facts: &dyn FactLookup) -> Vec<GateOutcome> {
        self.gates
            .iter()
            .map(|gate| run_gate(gate.as_ref(), document, facts))
            .collect()
    }
}

/// Run one gate, turning an internal error into an incomplete outcome
pub fn run_gate(gate: &dyn Gate, document: &Document, facts: &dyn FactLookup) -> GateOutcome {
    let name: GateName = gate.name();
    match gate.check(document, facts) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(gate = %name, error = %e, "Gate failed");
            incomplete_outcome(name, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_domain::{GateReport, Severity, Verdict, Violation, ViolationKind};
    use factgate_store::FactStore;

    struct BrokenGate;

    impl Gate for BrokenGate {
        fn name(&self) -> GateName {
            GateName::Consistency
        }

        fn check(&self, _document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
            Err(GatekeeperError::Validation("index out of range".to_string()))
        }
    }

    fn facts() -> FactStore {
        FactStore::from_json_str(r#"{"NVDA": {"price": 188.12, "change_pct": -0.386}}"#).unwrap()
    }

    #[test]
    fn test_builds_every_document_gate() {
        let gatekeeper = Gatekeeper::default_config().unwrap();
        let names: Vec<_> = gatekeeper.gates().iter().map(|g| g.name()).collect();
        assert_eq!(names, GateName::DOCUMENT_GATES.to_vec());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = GateConfig::default();
        config.structural.paywall_markers.clear();
        assert!(matches!(Gatekeeper::new(config), Err(GatekeeperError::Config(_))));
    }

    #[test]
    fn test_gate_error_fails_closed() {
        let outcome = run_gate(&BrokenGate, &Document::default(), &facts());
        assert!(!outcome.passed);
        let violation: &Violation = &outcome.violations[0];
        assert_eq!(violation.kind(), ViolationKind::ValidationIncomplete);
        assert_eq!(violation.severity(), Severity::Critical);
        assert!(violation.description().contains("index out of range"));
    }

    #[test]
    fn test_check_runs_all_gates() {
        let gatekeeper = Gatekeeper::default_config().unwrap();
        let document = Document {
            markup: "NVDA 股價 188.12，下跌 0.39%".to_string(),
            ..Default::default()
        };
        let outcomes = gatekeeper.check(&document, &facts());
        assert_eq!(outcomes.len(), 8);

        let report = GateReport::assemble("d", "article", "s", "m", outcomes);
        // No paywall, tldr, sources or disclaimer: structural problems only
        assert_eq!(report.verdict, Verdict::DraftOnly);
        assert!(report.gate(GateName::NumberTraceability).unwrap().passed);
    }
}
