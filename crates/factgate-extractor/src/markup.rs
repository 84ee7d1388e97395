//! Markup spans
//!
//! Numbers inside tags, comments and character entities are presentation
//! (`width:40%`, `&#8217;`), not reader-visible claims.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--[\s\S]*?-->|</?[A-Za-z][^<>]*>|<![^<>]*>|&#?[A-Za-z0-9]+;")
        .expect("valid markup regex")
});

/// Byte ranges of tags, comments and entities, in order
///
/// A `<` that never closes (`P/E < 20`) is ordinary text.
pub fn tag_spans(text: &str) -> Vec<Range<usize>> {
    MARKUP.find_iter(text).map(|m| m.range()).collect()
}

/// Text with tags and comments removed and common entities decoded
///
/// Each tag becomes a single space so words on either side stay apart.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in MARKUP.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        out.push_str(decode_entity(m.as_str()));
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn decode_entity(token: &str) -> &str {
    match token {
        "&amp;" => "&",
        "&lt;" => "<",
        "&gt;" => ">",
        "&quot;" => "\"",
        "&#39;" | "&apos;" => "'",
        "&nbsp;" => " ",
        t if t.starts_with('&') => "",
        _ => " ",
    }
}

/// Whether `offset` falls inside one of the sorted spans
pub fn in_spans(spans: &[Range<usize>], offset: usize) -> bool {
    let idx = spans.partition_point(|s| s.end <= offset);
    spans.get(idx).is_some_and(|s| s.start <= offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_spans() {
        let text = r#"<p style="width:40%">NVDA</p><!-- 30% -->"#;
        let spans = tag_spans(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(&text[spans[0].clone()], r#"<p style="width:40%">"#);
        assert_eq!(&text[spans[2].clone()], "<!-- 30% -->");
    }

    #[test]
    fn test_unterminated_angle_is_text() {
        assert!(tag_spans("P/E < 20 and falling").is_empty());
        assert!(tag_spans("a < 20 and b > 5").is_empty());
        assert_eq!(strip_markup("P/E < 20"), "P/E < 20");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup("<h2>NVDA</h2><p>股價&nbsp;188.12 &amp; more</p>"),
            " NVDA  股價 188.12 & more "
        );
    }

    #[test]
    fn test_in_spans() {
        let spans = vec![2..5, 10..12];
        assert!(!in_spans(&spans, 1));
        assert!(in_spans(&spans, 2));
        assert!(in_spans(&spans, 4));
        assert!(!in_spans(&spans, 5));
        assert!(in_spans(&spans, 11));
        assert!(!in_spans(&spans, 12));
    }
}
