//! The fact store and the visitor that builds it

use crate::error::StoreError;
use crate::normalize::{classify_key, find_dates, is_ticker_key, parse_numeric_string, round_to, KeyClass};
use crate::snapshot::{walk, SnapshotValue, SnapshotVisitor};
use factgate_domain::{canonical_number, FactLookup, TickerFacts, ValueSpace};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Change percentages outside this range are suspicious
const REASONABLE_PCT_RANGE: (f64, f64) = (-50.0, 100.0);

/// Change percentages outside this range are almost certainly unit errors
const EXTREME_PCT_RANGE: (f64, f64) = (-99.0, 500.0);

/// Display precisions a fact may be quoted at
const DISPLAY_DECIMALS: [i32; 2] = [1, 2];

/// Immutable snapshot of the permissible facts for one publishing cycle
///
/// Built once per run and shared read-only between gates.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    literals: HashSet<String>,
    plain_values: Vec<f64>,
    percent_values: Vec<f64>,
    dates: BTreeSet<String>,
    paths: BTreeMap<String, f64>,
    tickers: BTreeMap<String, TickerFacts>,
}

/// Counts describing a loaded store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactSummary {
    /// Canonical literals
    pub literals: usize,
    /// Distinct plain values
    pub plain_values: usize,
    /// Distinct percent values
    pub percent_values: usize,
    /// Canonical dates (full and month-day)
    pub dates: usize,
    /// Numeric source paths
    pub paths: usize,
    /// Indexed tickers
    pub tickers: usize,
}

impl FactStore {
    /// Build a store from snapshot JSON text
    ///
    /// Fails closed: unparseable JSON, a non-object root, or a snapshot with
    /// no numeric values is an error.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a store from an already parsed snapshot
    pub fn from_value(value: serde_json::Value) -> Result<Self, StoreError> {
        if !value.is_object() {
            return Err(StoreError::InvalidRoot(json_type_name(&value).to_string()));
        }
        Self::from_snapshot(&SnapshotValue::from(value))
    }

    /// Build a store from a snapshot tree
    pub fn from_snapshot(root: &SnapshotValue) -> Result<Self, StoreError> {
        if root.as_mapping().is_none() {
            return Err(StoreError::InvalidRoot("non-mapping".to_string()));
        }

        let mut builder = StoreBuilder::default();
        walk(root, &mut builder);
        let store = builder.finish();

        if store.literals.is_empty() {
            return Err(StoreError::Empty);
        }

        info!(
            literals = store.literals.len(),
            paths = store.paths.len(),
            tickers = store.tickers.len(),
            "Fact store loaded"
        );
        Ok(store)
    }

    /// Counts describing the store
    pub fn summary(&self) -> FactSummary {
        FactSummary {
            literals: self.literals.len(),
            plain_values: self.plain_values.len(),
            percent_values: self.percent_values.len(),
            dates: self.dates.len(),
            paths: self.paths.len(),
            tickers: self.tickers.len(),
        }
    }

    /// Indexed tickers in symbol order
    pub fn tickers(&self) -> impl Iterator<Item = (&str, &TickerFacts)> {
        self.tickers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical dates in order
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.dates.iter().map(String::as_str)
    }

    /// Numeric source paths in order
    pub fn paths(&self) -> impl Iterator<Item = (&str, f64)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FactLookup for FactStore {
    fn has_literal(&self, literal: &str) -> bool {
        self.literals.contains(literal)
    }

    fn values_between(&self, space: ValueSpace, low: f64, high: f64) -> &[f64] {
        let values = match space {
            ValueSpace::Plain => &self.plain_values,
            ValueSpace::Percent => &self.percent_values,
        };
        if low > high {
            return &[];
        }
        let start = values.partition_point(|v| *v < low);
        let end = values.partition_point(|v| *v <= high);
        &values[start..end.max(start)]
    }

    fn has_date(&self, canonical: &str) -> bool {
        self.dates.contains(canonical)
    }

    fn value_at(&self, path: &str) -> Option<f64> {
        self.paths.get(path).copied()
    }

    fn ticker(&self, symbol: &str) -> Option<&TickerFacts> {
        self.tickers
            .get(symbol)
            .or_else(|| self.tickers.get(&symbol.to_ascii_uppercase()))
    }
}

/// Visitor that accumulates the store's indexes
#[derive(Default)]
struct StoreBuilder {
    store: FactStore,
}

impl StoreBuilder {
    fn add_plain(&mut self, value: f64) {
        self.store.plain_values.push(value);
        self.store.literals.insert(canonical_number(value));
        for decimals in DISPLAY_DECIMALS {
            self.store.literals.insert(canonical_number(round_to(value, decimals)));
        }
    }

    fn add_percent(&mut self, value: f64) {
        self.store.percent_values.push(value);
        self.store.literals.insert(format!("{}%", canonical_number(value)));
        for decimals in DISPLAY_DECIMALS {
            self.store
                .literals
                .insert(format!("{}%", canonical_number(round_to(value, decimals))));
        }
    }

    fn add_number(&mut self, path: &str, key: Option<&str>, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.store.paths.entry(path.to_string()).or_insert(value);
        self.add_plain(value);

        match classify_key(key) {
            KeyClass::Plain => {}
            KeyClass::Percent => {
                check_percent_contract(path, value);
                self.add_percent(value);
            }
            KeyClass::DecimalFraction => {
                let pct = value * 100.0;
                check_percent_contract(path, pct);
                self.add_percent(pct);
            }
        }
    }

    fn add_string(&mut self, path: &str, key: Option<&str>, text: &str) {
        if let Some(parsed) = parse_numeric_string(text) {
            if parsed.percent {
                self.store.paths.entry(path.to_string()).or_insert(parsed.value);
                self.add_plain(parsed.value);
                self.add_percent(parsed.value);
            } else {
                self.add_number(path, key, parsed.value);
            }
            return;
        }

        for date in find_dates(text) {
            self.store.dates.insert(date.format("%Y-%m-%d").to_string());
            self.store.dates.insert(date.format("--%m-%d").to_string());
        }
    }

    fn finish(mut self) -> FactStore {
        for values in [&mut self.store.plain_values, &mut self.store.percent_values] {
            values.sort_by(f64::total_cmp);
            values.dedup();
        }
        self.store
    }
}

impl SnapshotVisitor for StoreBuilder {
    fn visit_leaf(&mut self, path: &str, key: Option<&str>, value: &SnapshotValue) {
        match value {
            SnapshotValue::Number(n) => self.add_number(path, key, *n),
            SnapshotValue::String(s) => self.add_string(path, key, s),
            _ => {}
        }
    }

    fn enter_mapping(&mut self, path: &str, key: Option<&str>, mapping: &BTreeMap<String, SnapshotValue>) {
        let symbol = mapping
            .get("ticker")
            .or_else(|| mapping.get("symbol"))
            .and_then(SnapshotValue::as_str)
            .filter(|s| is_ticker_key(s))
            .or(key.filter(|k| is_ticker_key(k)));

        let Some(symbol) = symbol else {
            return;
        };
        let facts = ticker_facts(mapping);
        if facts.price.is_none() && facts.change_pct.is_none() {
            return;
        }
        if self.store.tickers.contains_key(symbol) {
            debug!(symbol, path, "Ticker already indexed, keeping first occurrence");
            return;
        }
        self.store.tickers.insert(symbol.to_string(), facts);
    }
}

fn ticker_facts(mapping: &BTreeMap<String, SnapshotValue>) -> TickerFacts {
    let number = |m: &BTreeMap<String, SnapshotValue>, keys: &[&str]| {
        keys.iter().find_map(|k| m.get(*k).and_then(leaf_number))
    };
    let text = |m: &BTreeMap<String, SnapshotValue>, keys: &[&str]| {
        keys.iter().find_map(|k| m.get(*k).and_then(SnapshotValue::as_str).map(str::to_string))
    };

    let nested_price = mapping.get("price").and_then(SnapshotValue::as_mapping);

    let price = number(mapping, &["price", "last", "current_price", "close"])
        .or_else(|| nested_price.and_then(|p| number(p, &["value", "last", "close"])));
    let change_keys = ["change_pct", "changesPercentage", "change_percent", "pct_change"];
    let change_pct = number(mapping, &change_keys)
        .or_else(|| nested_price.and_then(|p| number(p, &change_keys)));
    let time_keys = ["as_of", "timestamp", "date"];
    let timestamp = text(mapping, &time_keys).or_else(|| nested_price.and_then(|p| text(p, &time_keys)));

    let mut multiples = BTreeMap::new();
    let valuation = mapping.get("valuation").and_then(SnapshotValue::as_mapping);
    for source in std::iter::once(mapping).chain(valuation) {
        for (name, value) in source {
            if is_multiple_key(name) {
                if let Some(v) = leaf_number(value) {
                    multiples.entry(name.clone()).or_insert(v);
                }
            }
        }
    }

    TickerFacts { price, change_pct, timestamp, multiples }
}

fn leaf_number(value: &SnapshotValue) -> Option<f64> {
    match value {
        SnapshotValue::Number(n) => Some(*n),
        SnapshotValue::String(s) => parse_numeric_string(s).map(|p| p.value),
        _ => None,
    }
}

fn is_multiple_key(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let prefixed = |prefix: &str| name == prefix || name.starts_with(&format!("{prefix}_"));
    prefixed("pe")
        || prefixed("ps")
        || prefixed("pb")
        || prefixed("peg")
        || name.starts_with("ev_")
        || name == "forward_pe"
        || name.ends_with("_multiple")
}

fn check_percent_contract(path: &str, pct: f64) {
    if pct < EXTREME_PCT_RANGE.0 || pct > EXTREME_PCT_RANGE.1 {
        warn!(path, value = pct, "Percent value outside extreme range, likely a unit error");
    } else if pct < REASONABLE_PCT_RANGE.0 || pct > REASONABLE_PCT_RANGE.1 {
        warn!(path, value = pct, "Percent value outside reasonable range");
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
