//! Metrics collected during gate runs
//!
//! Kept out of the report: elapsed time differs between runs, the report
//! must not.

use factgate_domain::{GateName, GateOutcome, Severity, ViolationKind};
use std::collections::BTreeMap;
use std::time::Duration;

/// Metrics collected during one or more gate runs
///
/// Tracks gates run, violations per severity and numbers scanned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    /// Articles validated
    pub runs: usize,

    /// Gate tasks that produced an outcome
    pub gates_run: usize,

    /// Gates that timed out or failed internally
    pub gates_incomplete: usize,

    /// Violations per severity
    pub violations: BTreeMap<Severity, usize>,

    /// Numbers found by the traceability gate
    pub numbers_extracted: u64,

    /// Wall-clock time spent
    pub elapsed: Duration,
}

impl RunMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one gate outcome
    pub fn record_outcome(&mut self, outcome: &GateOutcome) {
        self.gates_run += 1;
        for violation in &outcome.violations {
            *self.violations.entry(violation.severity()).or_insert(0) += 1;
        }
        if outcome
            .violations
            .iter()
            .any(|v| v.kind() == ViolationKind::ValidationIncomplete)
        {
            self.gates_incomplete += 1;
        }
        if outcome.gate == GateName::NumberTraceability {
            self.numbers_extracted += outcome.stats.get("extracted").copied().unwrap_or(0);
        }
    }

    /// Record a finished article
    pub fn record_run(&mut self, elapsed: Duration) {
        self.runs += 1;
        self.elapsed += elapsed;
    }

    /// Fold another set of metrics into this one
    pub fn merge(&mut self, other: &RunMetrics) {
        self.runs += other.runs;
        self.gates_run += other.gates_run;
        self.gates_incomplete += other.gates_incomplete;
        for (severity, count) in &other.violations {
            *self.violations.entry(*severity).or_insert(0) += count;
        }
        self.numbers_extracted += other.numbers_extracted;
        self.elapsed += other.elapsed;
    }

    /// Violations of one severity
    pub fn count(&self, severity: Severity) -> usize {
        self.violations.get(&severity).copied().unwrap_or(0)
    }

    /// Violations across all severities
    pub fn total_violations(&self) -> usize {
        self.violations.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Gate Run Summary".to_string(),
            "================".to_string(),
            format!("Articles: {}", self.runs),
            format!("Gates run: {}", self.gates_run),
            format!("Gates incomplete: {}", self.gates_incomplete),
            format!("Numbers extracted: {}", self.numbers_extracted),
            format!("Elapsed: {}ms", self.elapsed.as_millis()),
        ];

        if !self.violations.is_empty() {
            lines.push(String::new());
            lines.push("Violations by severity:".to_string());
            for (severity, count) in self.violations.iter().rev() {
                lines.push(format!("  {}: {}", severity, count));
            }
            lines.push(format!("  Total: {}", self.total_violations()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_domain::Violation;

    fn outcome(gate: GateName, kinds: &[ViolationKind]) -> GateOutcome {
        GateOutcome::new(
            gate,
            kinds.iter().map(|k| Violation::new(gate, *k, k.as_str())).collect(),
        )
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.runs, 0);
        assert_eq!(metrics.gates_run, 0);
        assert_eq!(metrics.total_violations(), 0);
    }

    #[test]
    fn test_record_outcome_counts_by_severity() {
        let mut metrics = RunMetrics::new();
        metrics.record_outcome(&outcome(
            GateName::NumberTraceability,
            &[ViolationKind::Fabrication, ViolationKind::Fabrication],
        ));
        metrics.record_outcome(&outcome(GateName::Paywall, &[ViolationKind::Structural]));
        metrics.record_outcome(&outcome(GateName::Compliance, &[]));

        assert_eq!(metrics.gates_run, 3);
        assert_eq!(metrics.count(Severity::Critical), 2);
        assert_eq!(metrics.count(Severity::High), 1);
        assert_eq!(metrics.count(Severity::Medium), 0);
        assert_eq!(metrics.total_violations(), 3);
    }

    #[test]
    fn test_numbers_extracted_from_traceability_stats() {
        let mut metrics = RunMetrics::new();
        metrics.record_outcome(&outcome(GateName::NumberTraceability, &[]).with_stat("extracted", 12));
        metrics.record_outcome(&outcome(GateName::Consistency, &[]).with_stat("extracted", 99));
        assert_eq!(metrics.numbers_extracted, 12);
    }

    #[test]
    fn test_incomplete_gates() {
        let mut metrics = RunMetrics::new();
        metrics.record_outcome(&outcome(GateName::Attribution, &[ViolationKind::ValidationIncomplete]));
        assert_eq!(metrics.gates_incomplete, 1);
    }

    #[test]
    fn test_merge_and_reset() {
        let mut first = RunMetrics::new();
        first.record_outcome(&outcome(GateName::Paywall, &[ViolationKind::Structural]));
        first.record_run(Duration::from_millis(40));

        let mut second = RunMetrics::new();
        second.record_outcome(&outcome(GateName::Paywall, &[ViolationKind::Structural]));
        second.record_run(Duration::from_millis(60));

        first.merge(&second);
        assert_eq!(first.runs, 2);
        assert_eq!(first.count(Severity::High), 2);
        assert_eq!(first.elapsed, Duration::from_millis(100));

        first.reset();
        assert_eq!(first, RunMetrics::default());
    }

    #[test]
    fn test_summary() {
        let mut metrics = RunMetrics::new();
        metrics.record_outcome(&outcome(GateName::Attribution, &[ViolationKind::Attribution]));
        metrics.record_run(Duration::from_millis(120));

        let summary = metrics.summary();
        assert!(summary.contains("Articles: 1"));
        assert!(summary.contains("Elapsed: 120ms"));
        assert!(summary.contains("critical: 1"));
        assert!(summary.contains("Total: 1"));
    }
}
