//! Number traceability: every reader-visible number must come from the
//! snapshot or from a verified computation.

use crate::computation::{verify_computations, ComputationCheck};
use crate::config::TraceabilityConfig;
use crate::gate::Gate;
use crate::GatekeeperError;
use factgate_domain::{
    values_equal, Document, ExtractedNumber, FactLookup, GateName, GateOutcome, NumberKind, SafeReason,
    ValueSpace, Violation, ViolationKind,
};
use factgate_extractor::{ExtractorConfig, NumberExtractor};
use tracing::debug;

/// Slack added to range queries so float noise cannot drop an edge match
const QUERY_SLACK: f64 = 1e-9;

/// How a number was traced
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    /// Formatting that needs no source
    Safe(SafeReason),
    /// Canonical literal found in the snapshot
    Exact,
    /// Within rounding tolerance of a snapshot value
    Tolerance,
    /// Equals a verified computation
    Computed(String),
    /// Equals a computation that failed verification; already reported there
    InvalidComputation(String),
    /// Traced to nothing
    Untraced,
}

/// Matches extracted numbers against the fact store
pub struct TraceabilityGate {
    extractor: NumberExtractor,
    config: TraceabilityConfig,
}

impl TraceabilityGate {
    /// Create a new traceability gate
    pub fn new(extraction: ExtractorConfig, config: TraceabilityConfig) -> Result<Self, GatekeeperError> {
        Ok(Self {
            extractor: NumberExtractor::new(extraction)?,
            config,
        })
    }

    /// Decide how one number is traced
    pub fn trace(&self, number: &ExtractedNumber, facts: &dyn FactLookup, computations: &ComputationCheck) -> Trace {
        if let Some(reason) = number.safe {
            return Trace::Safe(reason);
        }
        if number.kind == NumberKind::Date {
            return if facts.has_date(&number.canonical) || facts.has_literal(&number.raw) {
                Trace::Exact
            } else {
                Trace::Untraced
            };
        }
        if self.exact_literal(number, facts) {
            return Trace::Exact;
        }
        if self.tolerance_match(number, facts) {
            return Trace::Tolerance;
        }
        if let Some((id, _)) = computations.valid().iter().find(|(_, v)| self.matches_value(number, *v)) {
            return Trace::Computed(id.clone());
        }
        if let Some((id, _)) = computations.invalid().iter().find(|(_, v)| self.matches_value(number, *v)) {
            return Trace::InvalidComputation(id.clone());
        }
        Trace::Untraced
    }

    /// Canonical form, and for unsigned percentages its negation
    ///
    /// Percentages only ever match percent literals, so `30%` cannot trace to
    /// an unrelated plain fact that rounds to 30.
    fn exact_literal(&self, number: &ExtractedNumber, facts: &dyn FactLookup) -> bool {
        if facts.has_literal(&number.canonical) {
            return true;
        }
        sign_insensitive(number) && facts.has_literal(&format!("-{}", number.canonical))
    }

    fn tolerance_match(&self, number: &ExtractedNumber, facts: &dyn FactLookup) -> bool {
        let space = if number.kind == NumberKind::Percentage {
            ValueSpace::Percent
        } else {
            ValueSpace::Plain
        };
        signed_targets(number).into_iter().any(|target| {
            let reach = self.reach(number, target);
            facts
                .values_between(space, target - reach, target + reach)
                .iter()
                .any(|fact| self.within_tolerance(number, target, *fact))
        })
    }

    fn matches_value(&self, number: &ExtractedNumber, value: f64) -> bool {
        signed_targets(number)
            .into_iter()
            .any(|target| values_equal(target, value) || self.within_tolerance(number, target, value))
    }

    /// Widest distance any tolerance rule could accept around `target`
    fn reach(&self, number: &ExtractedNumber, target: f64) -> f64 {
        let relative = self.config.rounding_epsilon * target.abs() / (1.0 - self.config.rounding_epsilon);
        let rounding = if self.rounding_allowed(number) {
            number.half_display_step()
        } else {
            0.0
        };
        relative.max(rounding) * (1.0 + QUERY_SLACK) + QUERY_SLACK
    }

    fn within_tolerance(&self, number: &ExtractedNumber, shown: f64, fact: f64) -> bool {
        let diff = (shown - fact).abs();
        if values_equal(shown, fact) || diff <= self.config.rounding_epsilon * fact.abs() {
            return true;
        }
        self.rounding_allowed(number) && diff <= number.half_display_step() * (1.0 + QUERY_SLACK)
    }

    fn rounding_allowed(&self, number: &ExtractedNumber) -> bool {
        number.significant_digits() >= self.config.min_rounding_significant_digits
    }
}

/// Unsigned percentages match by absolute value; direction is often written
/// in words (`下跌 0.39%`)
fn sign_insensitive(number: &ExtractedNumber) -> bool {
    number.kind == NumberKind::Percentage && !number.explicit_sign && number.value > 0.0
}

/// Values a number may stand for
fn signed_targets(number: &ExtractedNumber) -> Vec<f64> {
    if sign_insensitive(number) {
        vec![number.value, -number.value]
    } else {
        vec![number.value]
    }
}

#[derive(Default)]
struct TraceCounts {
    safe: u64,
    exact: u64,
    tolerance: u64,
    computed: u64,
    fabricated: u64,
}

impl Gate for TraceabilityGate {
    fn name(&self) -> GateName {
        GateName::NumberTraceability
    }

    fn check(&self, document: &Document, facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let computations = verify_computations(&document.computations, facts);
        let numbers = self.extractor.scan_document(document);

        let mut violations = computations.violations.clone();
        let mut counts = TraceCounts::default();
        for number in &numbers {
            match self.trace(number, facts, &computations) {
                Trace::Safe(_) => counts.safe += 1,
                Trace::Exact => counts.exact += 1,
                Trace::Tolerance => counts.tolerance += 1,
                Trace::Computed(_) => counts.computed += 1,
                Trace::InvalidComputation(id) => {
                    debug!(number = %number.raw, computation = %id, "Number rests on a rejected computation");
                }
                Trace::Untraced => {
                    counts.fabricated += 1;
                    violations.push(
                        Violation::new(
                            GateName::NumberTraceability,
                            ViolationKind::Fabrication,
                            format!(
                                "{} {} is not in the snapshot or any verified computation",
                                number.kind, number.raw
                            ),
                        )
                        .with_excerpt(number.excerpt())
                        .at(number.location.clone()),
                    );
                }
            }
        }

        debug!(
            document = %document.id,
            extracted = numbers.len(),
            fabricated = counts.fabricated,
            computations_invalid = computations.invalid().len(),
            "Traced numbers"
        );

        Ok(GateOutcome::new(GateName::NumberTraceability, violations)
            .with_stat("extracted", numbers.len() as u64)
            .with_stat("safe", counts.safe)
            .with_stat("exact", counts.exact)
            .with_stat("tolerance", counts.tolerance)
            .with_stat("computed", counts.computed)
            .with_stat("fabricated", counts.fabricated)
            .with_stat("computations_invalid", computations.invalid().len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_domain::ComputationRecord;
    use factgate_store::FactStore;

    const SNAPSHOT: &str = r#"{
        "as_of": "2026-01-05T21:00:00Z",
        "NVDA": {"price": 188.12, "change_pct": -0.386, "market_cap": 4580000000000},
        "AMD": {"price": 214.35, "change_pct": 1.254, "pe_ttm": 118.23},
        "peers": {"AVGO": {"pe": 32.0}, "TSM": {"pe": 22.0}}
    }"#;

    fn gate() -> TraceabilityGate {
        TraceabilityGate::new(ExtractorConfig::default(), TraceabilityConfig::default()).unwrap()
    }

    fn store() -> FactStore {
        FactStore::from_json_str(SNAPSHOT).unwrap()
    }

    fn document(markup: &str) -> Document {
        Document {
            id: "test".to_string(),
            markup: markup.to_string(),
            ..Default::default()
        }
    }

    fn traces(markup: &str) -> Vec<(String, Trace)> {
        let gate = gate();
        let facts = store();
        let doc = document(markup);
        let computations = verify_computations(&doc.computations, &facts);
        gate.extractor
            .scan_document(&doc)
            .iter()
            .map(|n| (n.raw.clone(), gate.trace(n, &facts, &computations)))
            .collect()
    }

    #[test]
    fn test_price_and_unsigned_change_pass() {
        let outcome = gate().check(&document("NVDA 股價 188.12，下跌 0.39%"), &store()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
        assert_eq!(outcome.stats["extracted"], 2);
        assert_eq!(outcome.stats["fabricated"], 0);
    }

    #[test]
    fn test_explicit_sign_must_agree() {
        let result = traces("AMD +1.25% 與 NVDA +0.39%");
        assert_eq!(result[0].1, Trace::Exact);
        assert_eq!(result[1].1, Trace::Untraced);
    }

    #[test]
    fn test_fabricated_percentage() {
        let outcome = gate().check(&document("分析師預期上漲 30%"), &store()).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.violations.len(), 1);
        let violation = &outcome.violations[0];
        assert_eq!(violation.kind(), ViolationKind::Fabrication);
        assert!(violation.description().contains("30%"));
        assert_eq!(violation.location(), "markup");
    }

    #[test]
    fn test_percentage_needs_percent_fact() {
        // pe 29.96 displays as 30, but a forecast of 30% is not a P/E
        let facts = FactStore::from_json_str(r#"{"NVDA": {"price": 188.12, "pe_ttm": 29.96}}"#).unwrap();
        let outcome = gate().check(&document("NVDA 預期上漲 30%。"), &facts).unwrap();
        let kinds: Vec<_> = outcome.violations.iter().map(|v| v.kind()).collect();
        assert_eq!(kinds, vec![ViolationKind::Fabrication]);
    }

    #[test]
    fn test_unsigned_plain_number_keeps_its_sign() {
        let facts = FactStore::from_json_str(r#"{"eps_surprise": -3.47}"#).unwrap();
        let outcome = gate().check(&document("盈餘 3.47 美元"), &facts).unwrap();
        assert_eq!(outcome.stats["fabricated"], 1);

        let outcome = gate().check(&document("盈餘 -3.47 美元"), &facts).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
    }

    #[test]
    fn test_tolerance_and_display_rounding() {
        let result = traces("市值 $4.6T，本益比 118.2x，AMD 214.4");
        assert!(result.iter().all(|(_, t)| *t == Trace::Tolerance || *t == Trace::Exact), "{:?}", result);
    }

    #[test]
    fn test_rounding_needs_significant_digits() {
        // 1 has one significant digit; 1.254 rounds to it but is not close enough
        let result = traces("上漲 1%，上漲 1.3%");
        assert_eq!(result[0].1, Trace::Untraced);
        assert_eq!(result[1].1, Trace::Exact);
    }

    #[test]
    fn test_dates_and_safe_numbers() {
        let result = traces("截至 1/5，2026 年第 3 季；2026-02-01 公布");
        let kinds: Vec<_> = result.iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                Trace::Exact,
                Trace::Safe(SafeReason::Year),
                Trace::Safe(SafeReason::SmallInteger),
                Trace::Untraced
            ]
        );
    }

    #[test]
    fn test_verified_computation_traces_number() {
        let mut doc = document("同業本益比中位數 27.0x");
        doc.computations = vec![ComputationRecord::new("peer_median_pe", 27.0, "median")
            .with_input(32.0, "peers.AVGO.pe")
            .with_input(22.0, "peers.TSM.pe")];
        let outcome = gate().check(&doc, &store()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
        assert_eq!(outcome.stats["computed"], 1);
    }

    #[test]
    fn test_invalid_computation_is_not_also_fabrication() {
        let mut doc = document("同業本益比中位數 27.5x");
        doc.computations = vec![ComputationRecord::new("peer_median_pe", 27.5, "median")
            .with_input(32.0, "peers.AVGO.pe")
            .with_input(22.0, "peers.TSM.pe")];
        let outcome = gate().check(&doc, &store()).unwrap();
        let kinds: Vec<_> = outcome.violations.iter().map(|v| v.kind()).collect();
        assert_eq!(kinds, vec![ViolationKind::ComputationIntegrity]);
        assert_eq!(outcome.stats["computations_invalid"], 1);
    }

    #[test]
    fn test_numbers_in_fields_are_located() {
        let mut doc = document("");
        doc.fields.insert(
            "key_stocks".to_string(),
            serde_json::json!([{"ticker": "NVDA", "note": "目標價 $250"}]),
        );
        let outcome = gate().check(&doc, &store()).unwrap();
        assert_eq!(outcome.violations[0].location(), "fields.key_stocks[0].note");
    }
}
