//! Verification of disclosed computations
//!
//! A derived number is only traceable through a computation whose formula,
//! inputs and dependencies all check out.

use factgate_domain::{
    values_equal, ComputationRecord, FactLookup, Formula, GateName, ValueSpace, Violation, ViolationKind,
};
use std::collections::HashMap;

const COMPUTATION_PREFIX: &str = "computation:";

/// Result of verifying every computation of a document
#[derive(Debug, Clone, Default)]
pub struct ComputationCheck {
    valid: Vec<(String, f64)>,
    invalid: Vec<(String, f64)>,
    /// One `ComputationIntegrity` violation per failing record
    pub violations: Vec<Violation>,
}

impl ComputationCheck {
    /// Verified computations as `(id, value)`, in record order
    pub fn valid(&self) -> &[(String, f64)] {
        &self.valid
    }

    /// Rejected computations as `(id, value)`, in record order
    pub fn invalid(&self) -> &[(String, f64)] {
        &self.invalid
    }
}

/// Verify a document's computations against the facts
pub fn verify_computations(records: &[ComputationRecord], facts: &dyn FactLookup) -> ComputationCheck {
    let mut index: HashMap<&str, &ComputationRecord> = HashMap::new();
    let mut duplicates = Vec::new();
    for (position, record) in records.iter().enumerate() {
        if index.contains_key(record.id.as_str()) {
            duplicates.push(position);
        } else {
            index.insert(record.id.as_str(), record);
        }
    }

    let mut verifier = Verifier {
        index,
        facts,
        status: HashMap::new(),
        in_progress: Vec::new(),
        violations: Vec::new(),
    };

    let mut check = ComputationCheck::default();
    for (position, record) in records.iter().enumerate() {
        if duplicates.contains(&position) {
            verifier.violations.push(integrity_violation(&record.id, "duplicate computation id"));
            check.invalid.push((record.id.clone(), record.value));
            continue;
        }
        if verifier.visit(&record.id) {
            check.valid.push((record.id.clone(), record.value));
        } else {
            check.invalid.push((record.id.clone(), record.value));
        }
    }
    check.violations = verifier.violations;
    check
}

fn integrity_violation(id: &str, reason: &str) -> Violation {
    Violation::new(
        GateName::NumberTraceability,
        ViolationKind::ComputationIntegrity,
        format!("computation '{}': {}", id, reason),
    )
    .at(format!("computations.{}", id))
}

struct Verifier<'a> {
    index: HashMap<&'a str, &'a ComputationRecord>,
    facts: &'a dyn FactLookup,
    status: HashMap<&'a str, bool>,
    in_progress: Vec<&'a str>,
    violations: Vec<Violation>,
}

impl<'a> Verifier<'a> {
    /// Depth-first validity of one record; each record is judged once
    fn visit(&mut self, id: &'a str) -> bool {
        if let Some(&valid) = self.status.get(id) {
            return valid;
        }
        let Some(&record) = self.index.get(id) else {
            return false;
        };

        self.in_progress.push(id);
        let reasons = self.check_record(record);
        self.in_progress.pop();

        let valid = reasons.is_empty();
        if !valid {
            self.violations.push(integrity_violation(id, &reasons.join("; ")));
        }
        self.status.insert(id, valid);
        valid
    }

    fn check_record(&mut self, record: &'a ComputationRecord) -> Vec<String> {
        let mut reasons = Vec::new();

        if record.inputs.len() != record.sources.len() {
            reasons.push(format!(
                "{} inputs but {} sources",
                record.inputs.len(),
                record.sources.len()
            ));
        }

        match Formula::parse(&record.formula) {
            None => reasons.push(format!("unsupported formula '{}'", record.formula)),
            Some(formula) => match formula.arity() {
                Some(arity) if arity != record.inputs.len() => reasons.push(format!(
                    "{} takes {} inputs, {} given",
                    formula,
                    arity,
                    record.inputs.len()
                )),
                _ => match formula.evaluate(&record.inputs) {
                    None => reasons.push(format!("{} cannot be evaluated over the inputs", formula)),
                    Some(result) if !values_equal(result, record.value) => reasons.push(format!(
                        "{} of inputs is {}, declared {}",
                        formula, result, record.value
                    )),
                    Some(_) => {}
                },
            },
        }

        for (input, source) in record.inputs.iter().zip(&record.sources) {
            if let Some(reason) = self.check_input(*input, source.trim()) {
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }
        }
        reasons
    }

    fn check_input(&mut self, input: f64, source: &'a str) -> Option<String> {
        if let Some(dependency) = source.strip_prefix(COMPUTATION_PREFIX) {
            let dependency = dependency.trim();
            if self.in_progress.contains(&dependency) {
                return Some(format!("cycle through computation '{}'", dependency));
            }
            let Some(&upstream) = self.index.get(dependency) else {
                return Some(format!("references unknown computation '{}'", dependency));
            };
            if !self.visit(dependency) {
                return Some(format!("depends on invalid computation '{}'", dependency));
            }
            if !values_equal(upstream.value, input) {
                return Some(format!(
                    "input {} differs from computation '{}' ({})",
                    input, dependency, upstream.value
                ));
            }
            return None;
        }

        if let Some(value) = self.resolve_source(source) {
            if values_equal(value, input) {
                return None;
            }
            return Some(format!("input {} differs from '{}' ({})", input, source, value));
        }

        let known = [ValueSpace::Plain, ValueSpace::Percent]
            .into_iter()
            .any(|space| self.facts.values_between(space, input, input).iter().any(|v| values_equal(*v, input)));
        if known {
            None
        } else {
            Some(format!("input {} from '{}' is not in the snapshot", input, source))
        }
    }

    /// A fact path, or `TICKER.field` through the ticker index
    fn resolve_source(&self, source: &str) -> Option<f64> {
        if let Some(value) = self.facts.value_at(source) {
            return Some(value);
        }
        let (symbol, field) = source.split_once('.')?;
        self.facts.ticker(symbol)?.field(field)
    }
}
