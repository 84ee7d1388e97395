//! Gate outcomes and the per-article report

use crate::{GateName, Severity, Violation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Publication verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// At least one critical violation
    Block,
    /// Only high or medium violations
    DraftOnly,
    /// No violations
    Pass,
}

impl Verdict {
    /// Classify a set of violations
    pub fn classify<'a>(violations: impl IntoIterator<Item = &'a Violation>) -> Self {
        let worst = violations.into_iter().map(Violation::severity).max();
        match worst {
            Some(Severity::Critical) => Verdict::Block,
            Some(_) => Verdict::DraftOnly,
            None => Verdict::Pass,
        }
    }

    /// Whether the article may be published to the site
    pub fn can_publish(&self) -> bool {
        !matches!(self, Verdict::Block)
    }

    /// Whether the article may be sent to newsletter subscribers
    pub fn can_send_newsletter(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Get the verdict as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Block => "BLOCK",
            Verdict::DraftOnly => "DRAFT_ONLY",
            Verdict::Pass => "PASS",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one gate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateOutcome {
    /// Gate that produced this outcome
    pub gate: GateName,
    /// True when the gate raised no violations
    pub passed: bool,
    /// Violations in document order
    pub violations: Vec<Violation>,
    /// Deterministic counters (numbers scanned, mentions found, ...)
    pub stats: BTreeMap<String, u64>,
}

impl GateOutcome {
    /// Build an outcome from the violations a gate raised
    pub fn new(gate: GateName, violations: Vec<Violation>) -> Self {
        Self {
            gate,
            passed: violations.is_empty(),
            violations,
            stats: BTreeMap::new(),
        }
    }

    /// An outcome for a gate that could not complete
    pub fn incomplete(gate: GateName, violation: Violation) -> Self {
        Self::new(gate, vec![violation])
    }

    /// Attach a counter
    pub fn with_stat(mut self, name: &str, value: u64) -> Self {
        self.stats.insert(name.to_string(), value);
        self
    }
}

/// Violation counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// Critical violations
    pub critical: usize,
    /// High violations
    pub high: usize,
    /// Medium violations
    pub medium: usize,
}

impl SeverityCounts {
    /// Total violations
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium
    }
}

/// The terminal artifact of one validation run
///
/// Contains no clock readings, so identical inputs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateReport {
    /// Article identifier
    pub document_id: String,
    /// Document type
    pub doc_type: String,
    /// SHA-256 of the snapshot bytes
    pub snapshot_digest: String,
    /// SHA-256 of the document bytes
    pub document_digest: String,
    /// Per-gate outcomes in gate order
    pub gates: Vec<GateOutcome>,
    /// True when no gate raised a violation
    pub passed: bool,
    /// Publication verdict
    pub verdict: Verdict,
    /// Whether the article may be published
    pub can_publish: bool,
    /// Whether the article may be sent to newsletter subscribers
    pub can_send_newsletter: bool,
    /// Violation counts per severity
    pub counts: SeverityCounts,
}

impl GateReport {
    /// Assemble a report from gate outcomes
    ///
    /// Outcomes are sorted into gate order and the verdict is derived from
    /// every violation they carry.
    pub fn assemble(
        document_id: impl Into<String>,
        doc_type: impl Into<String>,
        snapshot_digest: impl Into<String>,
        document_digest: impl Into<String>,
        mut gates: Vec<GateOutcome>,
    ) -> Self {
        gates.sort_by_key(|g| g.gate);

        let mut counts = SeverityCounts::default();
        for violation in gates.iter().flat_map(|g| &g.violations) {
            match violation.severity() {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
            }
        }

        let verdict = Verdict::classify(gates.iter().flat_map(|g| &g.violations));

        Self {
            document_id: document_id.into(),
            doc_type: doc_type.into(),
            snapshot_digest: snapshot_digest.into(),
            document_digest: document_digest.into(),
            passed: counts.total() == 0,
            verdict,
            can_publish: verdict.can_publish(),
            can_send_newsletter: verdict.can_send_newsletter(),
            counts,
            gates,
        }
    }

    /// Every violation in gate order
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.gates.iter().flat_map(|g| g.violations.iter())
    }

    /// Outcome for a specific gate
    pub fn gate(&self, gate: GateName) -> Option<&GateOutcome> {
        self.gates.iter().find(|g| g.gate == gate)
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
