//! Declarative pattern table
//!
//! Each entry names a token shape, the regex that recognizes it and the
//! normalizer that turns a match into a value. The table is compiled into a
//! single alternation; earlier entries win when two shapes start at the same
//! position, so dates come before bare numbers.

use chrono::NaiveDate;
use factgate_domain::NumberKind;
use regex::Captures;

/// Output of a normalizer, before boundary and safety rules are applied
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Normalized {
    /// Unsigned displayed mantissa
    pub mantissa: f64,
    /// Decimals displayed in the mantissa
    pub decimals: u8,
    /// Magnitude multiplier
    pub scale: f64,
    /// Whether a minus sign was written
    pub negative: bool,
    /// Whether any sign was written
    pub explicit_sign: bool,
    /// Token shape
    pub kind: NumberKind,
    /// Canonical date (`2026-01-05`, `--01-05`), for dates
    pub date: Option<String>,
    /// Clock time rather than a date
    pub time_of_day: bool,
    /// Written with thousands separators
    pub grouped: bool,
    /// Byte offset where the token ends without its magnitude suffix
    pub magnitude_start: Option<usize>,
}

impl Normalized {
    fn number(kind: NumberKind, digits: &str) -> Option<Self> {
        let grouped = digits.contains(',');
        let plain = digits.replace(',', "");
        let mantissa: f64 = plain.parse().ok()?;
        let decimals = plain.split_once('.').map_or(0, |(_, frac)| frac.len().min(u8::MAX as usize) as u8);
        Some(Self {
            mantissa,
            decimals,
            scale: 1.0,
            negative: false,
            explicit_sign: false,
            kind,
            date: None,
            time_of_day: false,
            grouped,
            magnitude_start: None,
        })
    }

    fn date(canonical: String, ordinal: f64) -> Self {
        Self {
            mantissa: ordinal,
            decimals: 0,
            scale: 1.0,
            negative: false,
            explicit_sign: false,
            kind: NumberKind::Date,
            date: Some(canonical),
            time_of_day: false,
            grouped: false,
            magnitude_start: None,
        }
    }

    fn signed(mut self, sign: Option<&str>) -> Self {
        if let Some(sign) = sign {
            self.explicit_sign = true;
            self.negative = sign != "+";
        }
        self
    }

    /// Signed normalized value
    ///
    /// Rounded to the precision actually displayed, so `$35.1B` is exactly
    /// `35100000000` rather than a binary neighbour of it.
    pub fn value(&self) -> f64 {
        let places = self.decimals as i32 - self.scale.log10().round() as i32;
        let v = if places <= 0 {
            (self.mantissa * self.scale).round()
        } else {
            let factor = 10f64.powi(places);
            (self.mantissa * self.scale * factor).round() / factor
        };
        if self.negative {
            -v
        } else {
            v
        }
    }
}

type Normalizer = fn(&Captures<'_>) -> Option<Normalized>;

/// One row of the pattern table
pub(crate) struct PatternSpec {
    /// Name of the outer capture group
    pub name: &'static str,
    /// Regex body; inner groups are prefixed with the row name
    pub pattern: &'static str,
    /// Match to value
    pub normalize: Normalizer,
    /// A trailing ASCII letter that may follow the token (`T` after an ISO date)
    pub allowed_suffix: Option<char>,
}

/// The pattern table, in priority order
pub(crate) const PATTERNS: &[PatternSpec] = &[
    PatternSpec {
        name: "iso_date",
        pattern: r"(?P<iso_y>(?:19|20)\d{2})[-/](?P<iso_m>1[0-2]|0?[1-9])[-/](?P<iso_d>3[01]|[12]\d|0?[1-9])",
        normalize: normalize_iso_date,
        allowed_suffix: Some('T'),
    },
    PatternSpec {
        name: "cjk_date",
        pattern: r"(?:(?P<cjk_y>(?:19|20)\d{2})\s*年\s*)?(?P<cjk_m>1[0-2]|0?[1-9])\s*月\s*(?P<cjk_d>3[01]|[12]\d|0?[1-9])\s*[日號号]",
        normalize: normalize_cjk_date,
        allowed_suffix: None,
    },
    PatternSpec {
        name: "slash_date",
        pattern: r"(?P<slash_m>1[0-2]|0?[1-9])/(?P<slash_d>3[01]|[12]\d|0?[1-9])(?:/(?P<slash_y>(?:19|20)\d{2}|\d{2}))?",
        normalize: normalize_slash_date,
        allowed_suffix: None,
    },
    PatternSpec {
        name: "time",
        pattern: r"(?:2[0-3]|[01]?\d):[0-5]\d(?::[0-5]\d)?",
        normalize: normalize_time,
        allowed_suffix: None,
    },
    PatternSpec {
        name: "currency",
        pattern: r"(?P<cur_sign>[+\-−])?(?:US|NT|HK)?\$\s?(?P<cur_num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?P<cur_mag>\s?(?i:trillion|billion|million|thousand)|bn|mn|[TBMK]n?|\s?[兆億亿萬万])?",
        normalize: normalize_currency,
        allowed_suffix: None,
    },
    PatternSpec {
        name: "percent",
        pattern: r"(?P<pct_sign>[+\-−])?(?P<pct_num>\d+(?:\.\d+)?)\s?(?:%|％|個百分點|个百分点)",
        normalize: normalize_percent,
        allowed_suffix: None,
    },
    PatternSpec {
        name: "ratio",
        pattern: r"(?P<ratio_num>\d+(?:\.\d+)?)(?:[xX]|\s?倍)",
        normalize: normalize_ratio,
        allowed_suffix: None,
    },
    PatternSpec {
        name: "number",
        pattern: r"(?P<num_sign>[+\-−])?(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?P<num_mag>\s?[兆億亿萬万])?",
        normalize: normalize_number,
        allowed_suffix: None,
    },
];

/// The whole table as one alternation
pub(crate) fn alternation() -> String {
    PATTERNS
        .iter()
        .map(|spec| format!("(?P<{}>{})", spec.name, spec.pattern))
        .collect::<Vec<_>>()
        .join("|")
}

/// The row whose outer group matched
pub(crate) fn matched_spec(caps: &Captures<'_>) -> Option<&'static PatternSpec> {
    PATTERNS.iter().find(|spec| caps.name(spec.name).is_some())
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str())
}

fn parse_u32(caps: &Captures<'_>, name: &str) -> Option<u32> {
    group(caps, name)?.parse().ok()
}

fn full_date(raw: &str, y: i32, m: u32, d: u32) -> Normalized {
    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => Normalized::date(
            date.format("%Y-%m-%d").to_string(),
            (y as u32 * 10_000 + m * 100 + d) as f64,
        ),
        // Impossible calendar dates keep their raw text and never match a fact
        None => Normalized::date(raw.to_string(), 0.0),
    }
}

fn month_day(raw: &str, m: u32, d: u32) -> Normalized {
    // 2000 is a leap year, so 2/29 is accepted
    match NaiveDate::from_ymd_opt(2000, m, d) {
        Some(_) => Normalized::date(format!("--{:02}-{:02}", m, d), (m * 100 + d) as f64),
        None => Normalized::date(raw.to_string(), 0.0),
    }
}

fn normalize_iso_date(caps: &Captures<'_>) -> Option<Normalized> {
    let raw = group(caps, "iso_date")?;
    let y = parse_u32(caps, "iso_y")? as i32;
    Some(full_date(raw, y, parse_u32(caps, "iso_m")?, parse_u32(caps, "iso_d")?))
}

fn normalize_cjk_date(caps: &Captures<'_>) -> Option<Normalized> {
    let raw = group(caps, "cjk_date")?;
    let (m, d) = (parse_u32(caps, "cjk_m")?, parse_u32(caps, "cjk_d")?);
    Some(match parse_u32(caps, "cjk_y") {
        Some(y) => full_date(raw, y as i32, m, d),
        None => month_day(raw, m, d),
    })
}

fn normalize_slash_date(caps: &Captures<'_>) -> Option<Normalized> {
    let raw = group(caps, "slash_date")?;
    let (m, d) = (parse_u32(caps, "slash_m")?, parse_u32(caps, "slash_d")?);
    Some(match group(caps, "slash_y") {
        Some(y) if y.len() == 2 => full_date(raw, 2000 + y.parse::<i32>().ok()?, m, d),
        Some(y) => full_date(raw, y.parse().ok()?, m, d),
        None => month_day(raw, m, d),
    })
}

fn normalize_time(caps: &Captures<'_>) -> Option<Normalized> {
    let raw = group(caps, "time")?;
    let mut normalized = Normalized::date(raw.to_string(), 0.0);
    normalized.time_of_day = true;
    Some(normalized)
}

fn normalize_currency(caps: &Captures<'_>) -> Option<Normalized> {
    let mut normalized = Normalized::number(NumberKind::Price, group(caps, "cur_num")?)?;
    if let Some(mag) = caps.name("cur_mag") {
        normalized.scale = magnitude(mag.as_str().trim())?;
        normalized.magnitude_start = Some(mag.start());
    }
    Some(normalized.signed(group(caps, "cur_sign")))
}

fn normalize_percent(caps: &Captures<'_>) -> Option<Normalized> {
    let normalized = Normalized::number(NumberKind::Percentage, group(caps, "pct_num")?)?;
    Some(normalized.signed(group(caps, "pct_sign")))
}

fn normalize_ratio(caps: &Captures<'_>) -> Option<Normalized> {
    Normalized::number(NumberKind::Ratio, group(caps, "ratio_num")?)
}

fn normalize_number(caps: &Captures<'_>) -> Option<Normalized> {
    let digits = group(caps, "num")?;
    let kind = if digits.contains('.') { NumberKind::Decimal } else { NumberKind::Count };
    let mut normalized = Normalized::number(kind, digits)?;
    if let Some(mag) = caps.name("num_mag") {
        normalized.scale = magnitude(mag.as_str().trim())?;
        normalized.magnitude_start = Some(mag.start());
    }
    Some(normalized.signed(group(caps, "num_sign")))
}

fn magnitude(suffix: &str) -> Option<f64> {
    let scale = match suffix.to_ascii_lowercase().as_str() {
        "t" | "tn" | "trillion" | "兆" => 1e12,
        "b" | "bn" | "billion" => 1e9,
        "億" | "亿" => 1e8,
        "m" | "mn" | "million" => 1e6,
        "萬" | "万" => 1e4,
        "k" | "kn" | "thousand" => 1e3,
        _ => return None,
    };
    Some(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn first(text: &str) -> (&'static str, Normalized) {
        let regex = Regex::new(&alternation()).unwrap();
        let caps = regex.captures(text).unwrap();
        let spec = matched_spec(&caps).unwrap();
        (spec.name, (spec.normalize)(&caps).unwrap())
    }

    #[test]
    fn test_alternation_compiles() {
        assert!(Regex::new(&alternation()).is_ok());
    }

    #[test]
    fn test_dates_win_over_numbers() {
        let (name, n) = first("2026-01-05");
        assert_eq!(name, "iso_date");
        assert_eq!(n.date.as_deref(), Some("2026-01-05"));

        let (name, n) = first("2026年1月5日");
        assert_eq!(name, "cjk_date");
        assert_eq!(n.date.as_deref(), Some("2026-01-05"));

        let (name, n) = first("1/6");
        assert_eq!(name, "slash_date");
        assert_eq!(n.date.as_deref(), Some("--01-06"));
    }

    #[test]
    fn test_impossible_date_keeps_raw_text() {
        let (_, n) = first("2/30");
        assert_eq!(n.date.as_deref(), Some("2/30"));
    }

    #[test]
    fn test_currency_magnitudes() {
        let (name, n) = first("$4.6T");
        assert_eq!(name, "currency");
        assert_eq!(n.scale, 1e12);
        assert_eq!(n.decimals, 1);

        let (_, n) = first("-$3.2 billion");
        assert!(n.negative && n.explicit_sign);
        assert_eq!(n.scale, 1e9);
    }

    #[test]
    fn test_percent_and_ratio() {
        let (name, n) = first("+4.2%");
        assert_eq!(name, "percent");
        assert!(n.explicit_sign && !n.negative);
        assert_eq!(n.mantissa, 4.2);

        let (name, n) = first("52.3x");
        assert_eq!(name, "ratio");
        assert_eq!(n.mantissa, 52.3);

        let (name, _) = first("12倍");
        assert_eq!(name, "ratio");
    }

    #[test]
    fn test_grouped_numbers() {
        let (name, n) = first("1,234,567");
        assert_eq!(name, "number");
        assert!(n.grouped);
        assert_eq!(n.mantissa, 1_234_567.0);
        assert_eq!(n.kind, NumberKind::Count);

        let (_, n) = first("350億");
        assert_eq!(n.value(), 3.5e10);
    }
}
