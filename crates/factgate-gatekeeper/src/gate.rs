//! The gate seam

use crate::GatekeeperError;
use factgate_domain::{Document, FactLookup, GateName, GateOutcome, Violation, ViolationKind};

/// One independent check over a document
///
/// Gates read the document and the fact lookup and write only their own
/// outcome, so any number of them can run in parallel.
pub trait Gate: Send + Sync {
    /// Name reported in the outcome
    fn name(&self) -> GateName;

    /// Run the check
    ///
    /// An `Err` means the gate could not finish; callers report it as an
    /// incomplete gate, never as a pass.
    fn check(&self, document: &Document, facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError>;
}

/// Outcome for a gate that did not finish
pub fn incomplete_outcome(gate: GateName, detail: impl std::fmt::Display) -> GateOutcome {
    GateOutcome::incomplete(
        gate,
        Violation::new(
            gate,
            ViolationKind::ValidationIncomplete,
            format!("{} did not complete: {}", gate, detail),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_domain::Severity;

    #[test]
    fn test_incomplete_outcome_fails_closed() {
        let outcome = incomplete_outcome(GateName::Attribution, "worker panicked");
        assert!(!outcome.passed);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].severity(), Severity::Critical);
        assert!(outcome.violations[0].description().contains("worker panicked"));
    }
}
