//! Core Number Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::markup::{in_spans, tag_spans};
use crate::patterns::{alternation, matched_spec, Normalized};
use factgate_domain::{canonical_number, Document, ExtractedNumber, NumberKind, SafeReason};
use regex::{Captures, Regex};
use std::ops::Range;
use tracing::debug;

/// Finds numeric tokens in generated text
///
/// The pattern table is compiled once; each [`NumberExtractor::scan`] call is a
/// single forward pass over one piece of text.
#[derive(Debug, Clone)]
pub struct NumberExtractor {
    config: ExtractorConfig,
    regex: Regex,
}

impl NumberExtractor {
    /// Create a new extractor
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let regex = Regex::new(&alternation())?;
        Ok(Self { config, regex })
    }

    /// Create an extractor with the default configuration
    pub fn with_defaults() -> Result<Self, ExtractorError> {
        Self::new(ExtractorConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Lazily scan one piece of text
    ///
    /// Calling `scan` again on the same text yields the same sequence.
    pub fn scan<'a>(&'a self, text: &'a str, location: &'a str) -> Scan<'a> {
        Scan {
            extractor: self,
            text,
            location,
            pos: 0,
            markup: tag_spans(text),
        }
    }

    /// Scan every text segment of a document, in segment order
    pub fn scan_document(&self, document: &Document) -> Vec<ExtractedNumber> {
        let segments = document.text_segments();
        let numbers: Vec<ExtractedNumber> = segments
            .iter()
            .flat_map(|segment| self.scan(segment.text, &segment.location))
            .collect();
        debug!(
            document = %document.id,
            segments = segments.len(),
            numbers = numbers.len(),
            "Scanned document"
        );
        numbers
    }
}

/// Iterator over the numbers of one piece of text
pub struct Scan<'a> {
    extractor: &'a NumberExtractor,
    text: &'a str,
    location: &'a str,
    pos: usize,
    markup: Vec<Range<usize>>,
}

impl Iterator for Scan<'_> {
    type Item = ExtractedNumber;

    fn next(&mut self) -> Option<ExtractedNumber> {
        while self.pos < self.text.len() {
            let caps = self.extractor.regex.captures_at(self.text, self.pos)?;
            let whole = caps.get(0)?;
            // Every pattern consumes at least one digit
            self.pos = whole.end();
            if let Some(number) = self.build(&caps, whole.range()) {
                return Some(number);
            }
        }
        None
    }
}

impl Scan<'_> {
    fn build(&self, caps: &Captures<'_>, range: Range<usize>) -> Option<ExtractedNumber> {
        let spec = matched_spec(caps)?;
        let mut normalized = (spec.normalize)(caps)?;
        let (mut start, mut end) = (range.start, range.end);

        // A sign glued to a word is a hyphen (`2025-2026`), not a sign
        if normalized.explicit_sign {
            if let Some(sign) = self.text[start..].chars().next().filter(|c| is_sign(*c)) {
                if self.prev_char(start).is_some_and(is_glue) {
                    start += sign.len_utf8();
                    normalized.explicit_sign = false;
                    normalized.negative = false;
                }
            }
        }

        if self.text[start..].starts_with(|c: char| c.is_ascii_digit())
            && self.prev_char(start).is_some_and(is_glue)
        {
            return None;
        }

        // `2026-01-05T21:00` keeps its date
        let suffix_allowed =
            spec.allowed_suffix.is_some() && self.text[end..].chars().next() == spec.allowed_suffix;
        if self.glued_after(end) && !suffix_allowed {
            // `$5Bought` may still be `$5` once the magnitude letter is dropped
            end = normalized.magnitude_start.take()?;
            normalized.scale = 1.0;
            if self.glued_after(end) {
                return None;
            }
        }

        let safe = self.safe_reason(&normalized, start, end);
        let value = normalized.value();
        let canonical = match (&normalized.date, normalized.kind) {
            (Some(date), _) => date.clone(),
            (None, NumberKind::Percentage) => format!("{}%", canonical_number(value)),
            (None, _) => canonical_number(value),
        };

        let context_chars = self.extractor.config.context_chars;
        Some(ExtractedNumber {
            raw: self.text[start..end].to_string(),
            span: start..end,
            value,
            canonical,
            decimals: normalized.decimals,
            scale: normalized.scale,
            explicit_sign: normalized.explicit_sign,
            kind: normalized.kind,
            safe,
            context_before: collapse_whitespace(tail_chars(&self.text[..start], context_chars)),
            context_after: collapse_whitespace(head_chars(&self.text[end..], context_chars)),
            location: self.location.to_string(),
        })
    }

    fn safe_reason(&self, normalized: &Normalized, start: usize, end: usize) -> Option<SafeReason> {
        if in_spans(&self.markup, start) {
            return Some(SafeReason::Markup);
        }
        if normalized.time_of_day {
            return Some(SafeReason::TimeOfDay);
        }
        if normalized.kind != NumberKind::Count || normalized.explicit_sign || normalized.scale != 1.0 {
            return None;
        }

        let config = &self.extractor.config;
        let value = normalized.mantissa as u64;
        let digits = end - start;
        if !normalized.grouped && digits == 4 && (config.year_min..=config.year_max).contains(&value) {
            return Some(SafeReason::Year);
        }
        if self.is_list_index(start, end) {
            return Some(SafeReason::ListIndex);
        }
        if config.is_safe_integer(value) {
            return Some(SafeReason::SmallInteger);
        }
        None
    }

    fn is_list_index(&self, start: usize, end: usize) -> bool {
        let line_start = self.text[..start].rfind('\n').map_or(0, |i| i + 1);
        let at_line_start = self.text[line_start..start].trim().is_empty();
        let marker = self.text[end..].chars().next();
        at_line_start && matches!(marker, Some('.') | Some(')') | Some('、') | Some('．'))
    }

    fn prev_char(&self, offset: usize) -> Option<char> {
        self.text[..offset].chars().next_back()
    }

    fn glued_after(&self, end: usize) -> bool {
        let last = self.text[..end].chars().next_back();
        let next = self.text[end..].chars().next();
        last.is_some_and(|c| c.is_ascii_alphanumeric()) && next.is_some_and(|c| c.is_ascii_alphanumeric())
    }
}

fn is_sign(c: char) -> bool {
    matches!(c, '+' | '-' | '−')
}

/// Characters that glue a preceding word to a number (`H100`, `v1.2`, `Q4`)
fn is_glue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    s.char_indices().rev().nth(n - 1).map_or(s, |(i, _)| &s[i..])
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_and_head_chars() {
        assert_eq!(tail_chars("股價 188", 3), "188");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(tail_chars("ab", 0), "");
        assert_eq!(head_chars("，下跌 0.39%", 3), "，下跌");
        assert_eq!(head_chars("ab", 5), "ab");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \n\t b "), "a b ");
    }
}
