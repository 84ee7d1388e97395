//! Extracted numbers and canonical numeric formatting

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Maximum decimals kept in a canonical numeric literal
pub const CANONICAL_DECIMALS: usize = 6;

/// Format a number as its canonical literal
///
/// Up to six decimals, trailing zeros trimmed, negative zero printed as `0`.
/// Both the fact store and the extractor use this so literals compare as strings.
///
/// # Examples
///
/// ```
/// use factgate_domain::canonical_number;
///
/// assert_eq!(canonical_number(188.120), "188.12");
/// assert_eq!(canonical_number(-0.0), "0");
/// assert_eq!(canonical_number(4.6e12), "4600000000000");
/// ```
pub fn canonical_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut s = format!("{:.*}", CANONICAL_DECIMALS, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Shape of an extracted number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    /// Currency amount (`$188.85`, `$4.6T`)
    Price,
    /// Percentage (`+4.2%`)
    Percentage,
    /// Multiple (`52.3x`, `12倍`)
    Ratio,
    /// Calendar date or time of day
    Date,
    /// Integer count (`1,234`)
    Count,
    /// Plain decimal (`188.12`)
    Decimal,
}

impl NumberKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberKind::Price => "price",
            NumberKind::Percentage => "percentage",
            NumberKind::Ratio => "ratio",
            NumberKind::Date => "date",
            NumberKind::Count => "count",
            NumberKind::Decimal => "decimal",
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an extracted number needs no traceability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeReason {
    /// Small bare integer (counts, rankings)
    SmallInteger,
    /// Four-digit calendar year
    Year,
    /// Ordered-list index at the start of a line
    ListIndex,
    /// Inside a markup tag, comment or entity
    Markup,
    /// Clock time
    TimeOfDay,
}

impl SafeReason {
    /// Get the reason as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SafeReason::SmallInteger => "small_integer",
            SafeReason::Year => "year",
            SafeReason::ListIndex => "list_index",
            SafeReason::Markup => "markup",
            SafeReason::TimeOfDay => "time_of_day",
        }
    }
}

/// A numeric token found in generated content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedNumber {
    /// Exact substring of the scanned text
    pub raw: String,
    /// Byte span of `raw` within the scanned text
    pub span: Range<usize>,
    /// Normalized value (magnitudes applied, sign included)
    pub value: f64,
    /// Canonical literal (`0.39%` for percentages, ISO for dates)
    pub canonical: String,
    /// Decimals displayed in the mantissa
    pub decimals: u8,
    /// Magnitude multiplier applied to the mantissa (`1e12` for `T`)
    pub scale: f64,
    /// Whether a `+` or `-` sign was written
    pub explicit_sign: bool,
    /// Token shape
    pub kind: NumberKind,
    /// Safe-formatting reason, if the number needs no traceability
    pub safe: Option<SafeReason>,
    /// Text preceding the token
    pub context_before: String,
    /// Text following the token
    pub context_after: String,
    /// Document location of the scanned text
    pub location: String,
}

impl ExtractedNumber {
    /// Whether the number is exempt from traceability
    pub fn is_safe(&self) -> bool {
        self.safe.is_some()
    }

    /// Significant digits of the displayed mantissa
    ///
    /// `0.39` has two, `188.12` has five, `4.6` (of `$4.6T`) has two.
    pub fn significant_digits(&self) -> usize {
        let shown = format!("{:.*}", self.decimals as usize, (self.value / self.scale).abs());
        shown
            .chars()
            .filter(|c| c.is_ascii_digit())
            .skip_while(|c| *c == '0')
            .count()
    }

    /// Half of one displayed unit in the last place, in normalized units
    pub fn half_display_step(&self) -> f64 {
        0.5 * 10f64.powi(-(self.decimals as i32)) * self.scale
    }

    /// The token with its surrounding context
    pub fn excerpt(&self) -> String {
        format!("{}{}{}", self.context_before, self.raw, self.context_after)
    }
}
