//! Trait definitions for ground-truth lookup
//!
//! The gates only need to ask questions of the snapshot; the loader that builds
//! the answers lives in `factgate-store`.

use serde::Serialize;
use std::collections::BTreeMap;

/// Which numeric value set a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSpace {
    /// Every numeric value in the snapshot
    Plain,
    /// Values expressed in percent units (`4.2` meaning 4.2%)
    Percent,
}

/// Known facts about one ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickerFacts {
    /// Last price
    pub price: Option<f64>,
    /// Daily change in percent
    pub change_pct: Option<f64>,
    /// As-of timestamp, as written in the snapshot
    pub timestamp: Option<String>,
    /// Valuation multiples by field name (`pe_ttm`, `ev_sales`)
    pub multiples: BTreeMap<String, f64>,
}

impl TickerFacts {
    /// Look up a field by name (`price`, `change_pct`, or a multiple)
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "price" => self.price,
            "change_pct" | "change_percent" => self.change_pct,
            other => self.multiples.get(other).copied(),
        }
    }
}

/// Read-only access to the permissible facts of one publishing cycle
///
/// Implemented by the infrastructure layer (factgate-store)
pub trait FactLookup {
    /// Whether a canonical literal (`188.12`, `4.2%`) is known
    fn has_literal(&self, literal: &str) -> bool;

    /// Known values in `[low, high]`, ascending
    fn values_between(&self, space: ValueSpace, low: f64, high: f64) -> &[f64];

    /// Whether a canonical date is known (`2026-01-05`, or `--01-05` for month-day)
    fn has_date(&self, canonical: &str) -> bool;

    /// Value at a dotted source path (`tickers.NVDA.price.value`)
    fn value_at(&self, path: &str) -> Option<f64>;

    /// Facts for a ticker symbol
    fn ticker(&self, symbol: &str) -> Option<&TickerFacts>;
}
