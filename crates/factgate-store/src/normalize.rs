//! Leaf normalization: key classes, numeric strings and dates

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static NUMERIC_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<sign>[+\-−])?\s*(?:US)?\$?\s*(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)\s*(?P<suffix>%|％|[TBMK])?\s*$",
    )
    .expect("valid numeric string regex")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(?:19|20)\d{2})-(?P<m>\d{2})-(?P<d>\d{2})").expect("valid iso date regex")
});

/// Key suffixes whose values are already in percent units
const PERCENT_KEY_SUFFIXES: &[&str] = &["pct", "percent", "percentage", "_margin", "_growth", "_yield"];

/// Key suffix whose values are decimal fractions (`0.042` meaning 4.2%)
const DECIMAL_KEY_SUFFIX: &str = "_decimal";

/// Unit class of a numeric leaf, decided by its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Ordinary value
    Plain,
    /// Value is already a percentage
    Percent,
    /// Value is a fraction; ×100 gives the percentage
    DecimalFraction,
}

/// Classify a mapping key
pub fn classify_key(key: Option<&str>) -> KeyClass {
    let Some(key) = key else {
        return KeyClass::Plain;
    };
    let key = key.to_ascii_lowercase();
    if key.ends_with(DECIMAL_KEY_SUFFIX) {
        KeyClass::DecimalFraction
    } else if PERCENT_KEY_SUFFIXES.iter().any(|s| key.ends_with(s)) {
        KeyClass::Percent
    } else {
        KeyClass::Plain
    }
}

/// A number parsed out of a string leaf
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedString {
    /// Normalized value, magnitude applied
    pub value: f64,
    /// Whether the string carried a percent sign
    pub percent: bool,
}

/// Parse a numeric-looking string leaf (`"$4.60T"`, `"4.2%"`, `"1,234"`)
///
/// Strings with any other content return `None`.
pub fn parse_numeric_string(s: &str) -> Option<ParsedString> {
    let caps = NUMERIC_STRING.captures(s)?;
    let mut value: f64 = caps.name("num")?.as_str().replace(',', "").parse().ok()?;
    if caps.name("sign").is_some_and(|m| m.as_str() != "+") {
        value = -value;
    }
    let suffix = caps.name("suffix").map(|m| m.as_str());
    let multiplier = match suffix {
        Some("T") => 1e12,
        Some("B") => 1e9,
        Some("M") => 1e6,
        Some("K") => 1e3,
        _ => 1.0,
    };
    Some(ParsedString {
        value: value * multiplier,
        percent: matches!(suffix, Some("%") | Some("％")),
    })
}

/// Canonical ISO dates found anywhere in a string leaf
///
/// Invalid calendar dates (`2026-02-30`) are skipped.
pub fn find_dates(s: &str) -> Vec<NaiveDate> {
    ISO_DATE
        .captures_iter(s)
        .filter_map(|caps| {
            let y = caps.name("y")?.as_str().parse().ok()?;
            let m = caps.name("m")?.as_str().parse().ok()?;
            let d = caps.name("d")?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(y, m, d)
        })
        .collect()
}

/// Whether a key looks like a ticker symbol (`NVDA`, `BRK.B`)
pub fn is_ticker_key(key: &str) -> bool {
    let (base, class) = match key.split_once('.') {
        Some((base, class)) => (base, Some(class)),
        None => (key, None),
    };
    let base_ok = (1..=5).contains(&base.len()) && base.chars().all(|c| c.is_ascii_uppercase());
    let class_ok = class.is_none_or(|c| (1..=2).contains(&c.len()) && c.chars().all(|ch| ch.is_ascii_uppercase()));
    base_ok && class_ok
}

/// Round to a number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_key() {
        assert_eq!(classify_key(Some("change_pct")), KeyClass::Percent);
        assert_eq!(classify_key(Some("changesPercentage")), KeyClass::Percent);
        assert_eq!(classify_key(Some("gross_margin")), KeyClass::Percent);
        assert_eq!(classify_key(Some("revenue_growth_decimal")), KeyClass::DecimalFraction);
        assert_eq!(classify_key(Some("price")), KeyClass::Plain);
        assert_eq!(classify_key(None), KeyClass::Plain);
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(
            parse_numeric_string("$4.60T"),
            Some(ParsedString { value: 4.6e12, percent: false })
        );
        assert_eq!(
            parse_numeric_string("-4.2%"),
            Some(ParsedString { value: -4.2, percent: true })
        );
        assert_eq!(
            parse_numeric_string("1,234"),
            Some(ParsedString { value: 1234.0, percent: false })
        );
        assert_eq!(parse_numeric_string("NVDA"), None);
        assert_eq!(parse_numeric_string("up 4.2%"), None);
    }

    #[test]
    fn test_find_dates_validates_calendar() {
        let dates = find_dates("as of 2026-01-05T21:00:00Z, prior 2026-02-30");
        assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()]);
    }

    #[test]
    fn test_ticker_keys() {
        assert!(is_ticker_key("NVDA"));
        assert!(is_ticker_key("BRK.B"));
        assert!(!is_ticker_key("price"));
        assert!(!is_ticker_key("TOOLONG"));
        assert!(!is_ticker_key("BRK."));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(-0.386, 2), -0.39);
        assert_eq!(round_to(188.125, 1), 188.1);
    }
}
