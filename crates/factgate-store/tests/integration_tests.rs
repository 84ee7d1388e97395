//! Integration tests for factgate-store
//!
//! These tests load realistic snapshots and verify the lookups the gates rely on.

use factgate_domain::{FactLookup, ValueSpace};
use factgate_store::{FactStore, StoreError};

const FACT_PACK: &str = r#"{
    "meta": {"run_id": "2026-01-05-flash", "as_of": "2026-01-05T21:00:00Z"},
    "tickers": {
        "NVDA": {
            "price": {"value": 188.12, "change_pct": -0.386, "as_of": "2026-01-05"},
            "valuation": {"pe_ttm": 52.31, "pe_forward": 31.7, "ps_ttm": 28.4, "ev_sales": 27.9},
            "market_cap": "$4.60T"
        },
        "AMD": {
            "price": {"value": 214.35, "change_pct": 1.25, "as_of": "2026-01-05"},
            "valuation": {"pe_ttm": 118.2}
        }
    },
    "peers": [
        {"ticker": "AVGO", "price": 345.1, "changesPercentage": 2.04},
        {"ticker": "TSM", "price": 301.44, "changesPercentage": -0.87}
    ],
    "macro": {"ust_10y_yield": 4.18, "revenue_growth_decimal": 0.152}
}"#;

#[test]
fn test_load_fact_pack() {
    let store = FactStore::from_json_str(FACT_PACK).unwrap();
    let summary = store.summary();

    assert_eq!(summary.tickers, 4, "NVDA, AMD, AVGO and TSM should be indexed");
    assert!(summary.literals > summary.paths);
    assert!(summary.dates >= 2);
}

#[test]
fn test_nested_ticker_facts() {
    let store = FactStore::from_json_str(FACT_PACK).unwrap();

    let nvda = store.ticker("NVDA").expect("NVDA indexed");
    assert_eq!(nvda.price, Some(188.12));
    assert_eq!(nvda.change_pct, Some(-0.386));
    assert_eq!(nvda.timestamp.as_deref(), Some("2026-01-05"));
    assert_eq!(nvda.field("pe_ttm"), Some(52.31));
    assert_eq!(nvda.field("ev_sales"), Some(27.9));

    let avgo = store.ticker("AVGO").expect("AVGO indexed from array element");
    assert_eq!(avgo.price, Some(345.1));
    assert_eq!(avgo.change_pct, Some(2.04));
}

#[test]
fn test_paths_are_recorded() {
    let store = FactStore::from_json_str(FACT_PACK).unwrap();

    assert_eq!(store.value_at("tickers.NVDA.price.value"), Some(188.12));
    assert_eq!(store.value_at("tickers.NVDA.valuation.pe_ttm"), Some(52.31));
    assert_eq!(store.value_at("peers[1].price"), Some(301.44));
    let market_cap = store.value_at("tickers.NVDA.market_cap").unwrap();
    assert!((market_cap - 4.6e12).abs() < 1.0);
    assert_eq!(store.value_at("tickers.MSFT.price.value"), None);
}

#[test]
fn test_percent_forms() {
    let store = FactStore::from_json_str(FACT_PACK).unwrap();

    assert!(store.has_literal("1.25%"));
    assert!(store.has_literal("-0.87%"));
    assert!(store.has_literal("4.18%"), "yield fields are percent units");
    assert!(store.has_literal("15.2%"), "decimal fractions convert to percent");
    assert!(!store.has_literal("0.152%"));
    assert!(!store.values_between(ValueSpace::Percent, -0.4, -0.38).is_empty());
}

#[test]
fn test_dates_full_and_month_day() {
    let store = FactStore::from_json_str(FACT_PACK).unwrap();

    assert!(store.has_date("2026-01-05"));
    assert!(store.has_date("--01-05"));
    assert!(!store.has_date("2026-01-06"));
}

#[test]
fn test_magnitude_strings() {
    let store = FactStore::from_json_str(FACT_PACK).unwrap();
    assert!(!store.values_between(ValueSpace::Plain, 4.59e12, 4.61e12).is_empty());
}

#[test]
fn test_malformed_snapshot_fails_closed() {
    assert!(matches!(
        FactStore::from_json_str(r#"{"tickers": {"NVDA": "#),
        Err(StoreError::Parse(_))
    ));
    assert!(matches!(FactStore::from_json_str("\"text\""), Err(StoreError::InvalidRoot(_))));
    assert!(matches!(
        FactStore::from_json_str(r#"{"meta": {"run_id": "abc"}}"#),
        Err(StoreError::Empty)
    ));
}
