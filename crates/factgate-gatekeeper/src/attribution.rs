//! Institution attribution
//!
//! Sell-side names may only appear next to a primary source, so an article
//! cannot launder a number through "Goldman expects...".

use crate::config::AttributionConfig;
use crate::gate::Gate;
use crate::text::{back_chars, excerpt, find_term, forward_chars, is_bounded, sentence_bounds};
use crate::GatekeeperError;
use factgate_domain::{Document, FactLookup, GateName, GateOutcome, Violation, ViolationKind};
use factgate_extractor::strip_markup;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use tracing::debug;

const EXCERPT_CHARS: usize = 80;

/// Flags institution mentions that lack a primary-source marker
pub struct AttributionGate {
    matcher: Option<Regex>,
    names: HashMap<String, String>,
    markers: Vec<String>,
    window: usize,
}

/// One institution mention
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    /// Canonical institution name
    pub institution: String,
    /// Byte offset in the scanned text
    pub offset: usize,
    /// Whether a primary-source marker sits close enough
    pub sourced: bool,
}

impl AttributionGate {
    /// Compile the institution matcher
    pub fn new(config: &AttributionConfig) -> Result<Self, GatekeeperError> {
        let mut names = HashMap::new();
        let mut spellings = Vec::new();
        for institution in &config.institutions {
            for spelling in institution.spellings() {
                names.insert(spelling.to_lowercase(), institution.name.clone());
                spellings.push(spelling.to_string());
            }
        }
        // Longest first, so `Goldman Sachs` wins over `Goldman`
        spellings.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        spellings.dedup();

        let matcher = if spellings.is_empty() {
            None
        } else {
            let pattern = spellings.iter().map(|s| regex::escape(s)).collect::<Vec<_>>().join("|");
            Some(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
        };

        Ok(Self {
            matcher,
            names,
            markers: config.primary_source_markers.clone(),
            window: config.marker_window_chars,
        })
    }

    /// Every institution mention in one piece of plain text
    pub fn mentions(&self, text: &str) -> Vec<Mention> {
        let Some(matcher) = &self.matcher else {
            return Vec::new();
        };
        matcher
            .find_iter(text)
            .filter(|m| is_bounded(text, &m.range()))
            .map(|m| Mention {
                institution: self
                    .names
                    .get(&m.as_str().to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| m.as_str().to_string()),
                offset: m.start(),
                sourced: self.has_marker(text, m.range()),
            })
            .collect()
    }

    fn has_marker(&self, text: &str, mention: std::ops::Range<usize>) -> bool {
        let sentence = sentence_bounds(text, mention.start);
        let start = back_chars(text, mention.start, self.window, sentence.start);
        let end = forward_chars(text, mention.end, self.window, sentence.end.max(mention.end));
        let window = &text[start..end];
        self.markers.iter().any(|marker| !find_term(window, marker).is_empty())
    }
}

impl Gate for AttributionGate {
    fn name(&self) -> GateName {
        GateName::Attribution
    }

    fn check(&self, document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let mut violations = Vec::new();
        let mut total = 0u64;
        for segment in document.text_segments() {
            let text = strip_markup(segment.text);
            for mention in self.mentions(&text) {
                total += 1;
                if mention.sourced {
                    continue;
                }
                violations.push(
                    Violation::new(
                        GateName::Attribution,
                        ViolationKind::Attribution,
                        format!("{} is cited without a primary source", mention.institution),
                    )
                    .with_excerpt(excerpt(&text, sentence_bounds(&text, mention.offset), EXCERPT_CHARS))
                    .at(segment.location.clone()),
                );
            }
        }

        debug!(document = %document.id, mentions = total, unsourced = violations.len(), "Scanned attributions");

        let unsourced = violations.len() as u64;
        Ok(GateOutcome::new(GateName::Attribution, violations)
            .with_stat("mentions", total)
            .with_stat("sourced", total - unsourced)
            .with_stat("unsourced", unsourced))
    }
}
