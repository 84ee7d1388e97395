//! Disclosed computations
//!
//! A derived number in an article (a peer median, a spread, a growth rate) is
//! only acceptable when the author discloses how it was computed. The formula is
//! re-evaluated deterministically over the declared inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative slack that absorbs binary floating-point representation only
pub const REPRESENTATION_EPSILON: f64 = 1e-9;

/// Whether two values are equal up to floating-point representation
pub fn values_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= REPRESENTATION_EPSILON * scale
}

/// A derivation claimed by the content author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationRecord {
    /// Identifier, referenced by other records as `computation:<id>`
    pub id: String,

    /// Declared result
    pub value: f64,

    /// Formula name, e.g. `median` or `pct_change(a, b)`
    pub formula: String,

    /// Input values in formula order
    #[serde(default, alias = "input_values")]
    pub inputs: Vec<f64>,

    /// Where each input comes from: a fact path, `TICKER.field`, or `computation:<id>`
    #[serde(default, alias = "input_sources")]
    pub sources: Vec<String>,
}

impl ComputationRecord {
    /// Create a new computation record
    pub fn new(id: impl Into<String>, value: f64, formula: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value,
            formula: formula.into(),
            inputs: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Add an input with its source
    pub fn with_input(mut self, value: f64, source: impl Into<String>) -> Self {
        self.inputs.push(value);
        self.sources.push(source.into());
        self
    }

    /// Ids of other computations this record depends on
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .filter_map(|s| s.strip_prefix("computation:"))
            .map(str::trim)
    }
}

/// Supported formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula {
    /// Median of all inputs
    Median,
    /// Arithmetic mean of all inputs
    Mean,
    /// Sum of all inputs
    Sum,
    /// Smallest input
    Min,
    /// Largest input
    Max,
    /// `a - b`
    Difference,
    /// `a / b`
    Ratio,
    /// `(b - a) / a * 100`
    PctChange,
    /// Product of all inputs
    Product,
}

impl Formula {
    /// Parse a formula name; call syntax such as `median(a, b, c)` is accepted
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.split('(').next().unwrap_or_default().trim().to_lowercase();
        match name.as_str() {
            "median" => Some(Formula::Median),
            "mean" | "average" | "avg" => Some(Formula::Mean),
            "sum" => Some(Formula::Sum),
            "min" => Some(Formula::Min),
            "max" => Some(Formula::Max),
            "difference" | "diff" | "subtract" => Some(Formula::Difference),
            "ratio" | "divide" => Some(Formula::Ratio),
            "pct_change" | "percent_change" => Some(Formula::PctChange),
            "product" | "multiply" => Some(Formula::Product),
            _ => None,
        }
    }

    /// Number of inputs the formula requires, if fixed
    pub fn arity(&self) -> Option<usize> {
        match self {
            Formula::Difference | Formula::Ratio | Formula::PctChange => Some(2),
            _ => None,
        }
    }

    /// Evaluate over the inputs
    ///
    /// Returns `None` when the inputs do not fit the formula (empty, wrong
    /// arity, division by zero).
    pub fn evaluate(&self, inputs: &[f64]) -> Option<f64> {
        if inputs.is_empty() || inputs.iter().any(|v| !v.is_finite()) {
            return None;
        }
        if let Some(arity) = self.arity() {
            if inputs.len() != arity {
                return None;
            }
        }

        let result = match self {
            Formula::Median => {
                let mut sorted = inputs.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Formula::Mean => inputs.iter().sum::<f64>() / inputs.len() as f64,
            Formula::Sum => inputs.iter().sum(),
            Formula::Min => inputs.iter().cloned().fold(f64::INFINITY, f64::min),
            Formula::Max => inputs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Formula::Difference => inputs[0] - inputs[1],
            Formula::Ratio => {
                if inputs[1] == 0.0 {
                    return None;
                }
                inputs[0] / inputs[1]
            }
            Formula::PctChange => {
                if inputs[0] == 0.0 {
                    return None;
                }
                (inputs[1] - inputs[0]) / inputs[0] * 100.0
            }
            Formula::Product => inputs.iter().product(),
        };

        result.is_finite().then_some(result)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Formula::Median => "median",
            Formula::Mean => "mean",
            Formula::Sum => "sum",
            Formula::Min => "min",
            Formula::Max => "max",
            Formula::Difference => "difference",
            Formula::Ratio => "ratio",
            Formula::PctChange => "pct_change",
            Formula::Product => "product",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(Formula::Median.evaluate(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(Formula::Median.evaluate(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_parse_accepts_call_syntax() {
        assert_eq!(Formula::parse("median(a, b, c)"), Some(Formula::Median));
        assert_eq!(Formula::parse("AVG"), Some(Formula::Mean));
        assert_eq!(Formula::parse("geometric_mean"), None);
    }

    #[test]
    fn test_fixed_arity() {
        assert_eq!(Formula::Difference.evaluate(&[5.0, 3.0]), Some(2.0));
        assert_eq!(Formula::Difference.evaluate(&[5.0]), None);
        assert!(values_equal(Formula::PctChange.evaluate(&[100.0, 110.0]).unwrap(), 10.0));
        assert_eq!(Formula::Ratio.evaluate(&[1.0, 0.0]), None);
    }

    #[test]
    fn test_values_equal_is_representation_only() {
        assert!(values_equal(0.1 + 0.2, 0.3));
        assert!(!values_equal(52.3, 52.31));
        assert!(!values_equal(2.5, 2.5001));
    }

    #[test]
    fn test_dependencies() {
        let record = ComputationRecord::new("spread", 2.0, "difference")
            .with_input(5.0, "computation:peer_median")
            .with_input(3.0, "tickers.NVDA.valuation.pe_ttm");
        assert_eq!(record.dependencies().collect::<Vec<_>>(), vec!["peer_median"]);
    }

    #[test]
    fn test_record_deserializes_aliases() {
        let record: ComputationRecord = serde_json::from_str(
            r#"{"id":"m","value":2.0,"formula":"median","input_values":[1,2,3],"input_sources":["a","b","c"]}"#,
        )
        .unwrap();
        assert_eq!(record.inputs, vec![1.0, 2.0, 3.0]);
        assert_eq!(record.sources.len(), 3);
    }
}
