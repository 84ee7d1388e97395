//! Text helpers shared by the language gates
//!
//! Case folding is ASCII-only so byte offsets into the folded text are valid
//! offsets into the original.

use std::ops::Range;

/// Whether `c` ends a sentence on its own
fn is_terminator(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '!' | '?' | '；' | ';' | '\n')
}

/// Whether the char at `offset` ends a sentence
///
/// A `.` only ends a sentence before whitespace or the end of text, so
/// `188.12` stays whole.
fn ends_sentence(text: &str, offset: usize, c: char) -> bool {
    if is_terminator(c) {
        return true;
    }
    c == '.'
        && text[offset + c.len_utf8()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
}

/// Byte range of the sentence containing `offset`, terminator excluded
pub(crate) fn sentence_bounds(text: &str, offset: usize) -> Range<usize> {
    let start = text[..offset]
        .char_indices()
        .rev()
        .find(|&(i, c)| ends_sentence(text, i, c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let end = text[offset..]
        .char_indices()
        .find(|&(i, c)| ends_sentence(text, offset + i, c))
        .map_or(text.len(), |(i, _)| offset + i);
    start..end
}

/// Byte offset `n` characters before `offset`, stopping at `floor`
pub(crate) fn back_chars(text: &str, offset: usize, n: usize, floor: usize) -> usize {
    if n == 0 {
        return offset;
    }
    text[floor..offset]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map_or(floor, |(i, _)| floor + i)
}

/// Byte offset `n` characters after `offset`, stopping at `ceiling`
pub(crate) fn forward_chars(text: &str, offset: usize, n: usize, ceiling: usize) -> usize {
    text[offset..ceiling]
        .char_indices()
        .nth(n)
        .map_or(ceiling, |(i, _)| offset + i)
}

/// Whether a match at `range` stands alone as a word
///
/// Edges made of ASCII letters or digits need a non-alphanumeric neighbour;
/// CJK edges match as substrings.
pub(crate) fn is_bounded(text: &str, range: &Range<usize>) -> bool {
    let matched = &text[range.clone()];
    let first = matched.chars().next();
    let last = matched.chars().next_back();
    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();

    let glued = |edge: Option<char>, neighbour: Option<char>| {
        edge.is_some_and(|c| c.is_ascii_alphanumeric()) && neighbour.is_some_and(|c| c.is_ascii_alphanumeric())
    };
    !glued(first, before) && !glued(last, after)
}

/// Start offsets of every bounded, ASCII-case-insensitive occurrence of `term`
pub(crate) fn find_term(text: &str, term: &str) -> Vec<usize> {
    if term.is_empty() {
        return Vec::new();
    }
    let folded = text.to_ascii_lowercase();
    let needle = term.to_ascii_lowercase();
    folded
        .match_indices(&needle)
        .map(|(i, _)| i)
        .filter(|&i| is_bounded(text, &(i..i + needle.len())))
        .collect()
}

/// Whether `text` contains `term` as a bounded word
pub(crate) fn contains_term(text: &str, term: &str) -> bool {
    !find_term(text, term).is_empty()
}

/// Trimmed excerpt of `range`, capped at `max_chars`
pub(crate) fn excerpt(text: &str, range: Range<usize>, max_chars: usize) -> String {
    let trimmed = text[range].trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}…", &trimmed[..i]),
        None => trimmed.to_string(),
    }
}

/// Uppercase ASCII tokens of 2 to 5 letters, with their offsets
pub(crate) fn uppercase_tokens(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_uppercase() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_uppercase() {
            i += 1;
        }
        let range = start..i;
        if (2..=5).contains(&range.len()) && is_bounded(text, &range) {
            tokens.push((start, &text[range]));
        }
    }
    tokens
}
