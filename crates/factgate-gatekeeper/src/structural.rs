//! Structural gates: paywall placement, required sections, source
//! sufficiency and bilingual alignment

use crate::config::{SectionRule, SourceRules, StructuralConfig};
use crate::gate::Gate;
use crate::text::{contains_term, is_bounded, uppercase_tokens};
use crate::GatekeeperError;
use factgate_domain::{Document, FactLookup, GateName, GateOutcome, Violation, ViolationKind};
use factgate_extractor::strip_markup;
use std::collections::BTreeSet;
use std::fmt;

/// Checks that the paywall marker splits the markup into a real preview and
/// a non-empty members region
pub struct PaywallGate {
    markers: Vec<String>,
    min_public_chars: usize,
}

impl PaywallGate {
    /// Create a new paywall gate
    pub fn new(config: &StructuralConfig) -> Self {
        Self {
            markers: config
                .paywall_markers
                .iter()
                .filter(|m| !m.trim().is_empty())
                .cloned()
                .collect(),
            min_public_chars: config.min_public_chars,
        }
    }

    /// Byte ranges of every marker occurrence, in order
    fn occurrences(&self, markup: &str) -> Vec<std::ops::Range<usize>> {
        let mut found: Vec<_> = self
            .markers
            .iter()
            .flat_map(|marker| markup.match_indices(marker.as_str()).map(|(i, m)| i..i + m.len()))
            .collect();
        found.sort_by_key(|r| r.start);
        found.dedup_by_key(|r| r.start);
        found
    }
}

impl Gate for PaywallGate {
    fn name(&self) -> GateName {
        GateName::Paywall
    }

    fn check(&self, document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let structural = |description: String| {
            Violation::new(GateName::Paywall, ViolationKind::Structural, description).at("markup")
        };

        let occurrences = self.occurrences(&document.markup);
        let mut violations = Vec::new();
        let mut public_chars = 0;
        match occurrences.as_slice() {
            [] => violations.push(structural("paywall marker is missing".to_string())),
            [marker] => {
                let public = strip_markup(&document.markup[..marker.start]);
                public_chars = public.trim().chars().count();
                if public_chars < self.min_public_chars {
                    violations.push(structural(format!(
                        "public preview has {} characters, at least {} required",
                        public_chars, self.min_public_chars
                    )));
                }
                if strip_markup(&document.markup[marker.end..]).trim().is_empty() {
                    violations.push(structural("members-only region is empty".to_string()));
                }
            }
            many => violations.push(structural(format!(
                "paywall marker appears {} times, exactly once required",
                many.len()
            ))),
        }

        Ok(GateOutcome::new(GateName::Paywall, violations)
            .with_stat("markers", occurrences.len() as u64)
            .with_stat("public_chars", public_chars as u64))
    }
}

/// Checks that every section the document type requires is present
pub struct SectionsGate {
    config: StructuralConfig,
}

impl SectionsGate {
    /// Create a new required-sections gate
    pub fn new(config: &StructuralConfig) -> Self {
        Self { config: config.clone() }
    }

    fn check_rule(&self, document: &Document, rule: &SectionRule) -> Option<String> {
        if !document.has_field(&rule.id) && !markup_has_section(&document.markup, &rule.id) {
            return Some(format!("required section '{}' is missing", rule.id));
        }
        let count = document.field_len(&rule.id)?;
        if let Some(min) = rule.min_items.filter(|min| count < *min) {
            return Some(format!("section '{}' has {} items, at least {} required", rule.id, count, min));
        }
        if let Some(max) = rule.max_items.filter(|max| count > *max) {
            return Some(format!("section '{}' has {} items, at most {} allowed", rule.id, count, max));
        }
        None
    }
}

/// `id="…"` or `data-section="…"` in either quote style
fn markup_has_section(markup: &str, id: &str) -> bool {
    ["id", "data-section"].iter().any(|attr| {
        markup.contains(&format!("{}=\"{}\"", attr, id)) || markup.contains(&format!("{}='{}'", attr, id))
    })
}

impl Gate for SectionsGate {
    fn name(&self) -> GateName {
        GateName::RequiredSections
    }

    fn check(&self, document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let rules = self.config.sections_for(&document.doc_type);
        let violations: Vec<Violation> = rules
            .iter()
            .filter_map(|rule| {
                self.check_rule(document, rule).map(|description| {
                    Violation::new(GateName::RequiredSections, ViolationKind::Structural, description)
                        .at(format!("fields.{}", rule.id))
                })
            })
            .collect();

        let failed = violations.len() as u64;
        Ok(GateOutcome::new(GateName::RequiredSections, violations)
            .with_stat("required", rules.len() as u64)
            .with_stat("failed", failed))
    }
}

/// Checks that the article cites enough sources and is not built on a rumor
pub struct SourcesGate {
    rules: SourceRules,
}

impl SourcesGate {
    /// Create a new sources gate
    pub fn new(config: &StructuralConfig) -> Self {
        Self {
            rules: config.sources.clone(),
        }
    }
}

impl Gate for SourcesGate {
    fn name(&self) -> GateName {
        GateName::Sources
    }

    fn check(&self, document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let insufficient = |description: String, location: &str| {
            Violation::new(GateName::Sources, ViolationKind::Structural, description).at(location)
        };

        let count = document.sources.len();
        let publishers: BTreeSet<String> = document
            .sources
            .iter()
            .filter_map(|source| source.publisher())
            .map(str::to_lowercase)
            .collect();

        let mut violations = Vec::new();
        if count < self.rules.min_count {
            violations.push(insufficient(
                format!("{} sources cited, at least {} required", count, self.rules.min_count),
                "sources",
            ));
        }
        if publishers.len() < self.rules.min_distinct_publishers {
            violations.push(insufficient(
                format!(
                    "{} distinct publishers, at least {} required",
                    publishers.len(),
                    self.rules.min_distinct_publishers
                ),
                "sources",
            ));
        }
        let rumor = document
            .primary_event
            .as_ref()
            .is_some_and(|event| event.event_type.trim().eq_ignore_ascii_case("rumor"));
        if rumor && !self.rules.allow_rumor_as_primary {
            violations.push(insufficient(
                "primary event is a rumor".to_string(),
                "primary_event.event_type",
            ));
        }

        Ok(GateOutcome::new(GateName::Sources, violations)
            .with_stat("sources", count as u64)
            .with_stat("publishers", publishers.len() as u64))
    }
}

/// Lexicon-derived tone of a passage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    /// Only positive terms
    Positive,
    /// Only negative terms
    Negative,
    /// Both
    Mixed,
    /// Neither
    Neutral,
}

impl Sentiment {
    /// Name as reported
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Mixed => "mixed",
            Sentiment::Neutral => "neutral",
        }
    }

    fn opposes(&self, other: Sentiment) -> bool {
        matches!(
            (self, other),
            (Sentiment::Positive, Sentiment::Negative) | (Sentiment::Negative, Sentiment::Positive)
        )
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Checks that the conclusion and its secondary-language summary agree
pub struct BilingualGate {
    positive_terms: Vec<String>,
    negative_terms: Vec<String>,
    entity_stopwords: Vec<String>,
}

impl BilingualGate {
    /// Create a new bilingual gate
    pub fn new(config: &StructuralConfig, entity_stopwords: &[String]) -> Self {
        Self {
            positive_terms: config.positive_terms.clone(),
            negative_terms: config.negative_terms.clone(),
            entity_stopwords: entity_stopwords.to_vec(),
        }
    }

    /// Tone of a passage
    pub fn sentiment(&self, text: &str) -> Sentiment {
        let positive = self.positive_terms.iter().any(|t| contains_term(text, t));
        let negative = self.negative_terms.iter().any(|t| contains_term(text, t));
        match (positive, negative) {
            (true, false) => Sentiment::Positive,
            (false, true) => Sentiment::Negative,
            (true, true) => Sentiment::Mixed,
            (false, false) => Sentiment::Neutral,
        }
    }

    fn entities(&self, text: &str, declared: &[String]) -> BTreeSet<String> {
        if declared.is_empty() {
            uppercase_tokens(text)
                .into_iter()
                .filter(|(_, token)| !self.entity_stopwords.iter().any(|s| s.eq_ignore_ascii_case(token)))
                .map(|(_, token)| token.to_string())
                .collect()
        } else {
            declared
                .iter()
                .filter(|entity| {
                    !entity.is_empty()
                        && text
                            .match_indices(entity.as_str())
                            .any(|(i, m)| is_bounded(text, &(i..i + m.len())))
                })
                .cloned()
                .collect()
        }
    }
}

impl Gate for BilingualGate {
    fn name(&self) -> GateName {
        GateName::BilingualAlignment
    }

    fn check(&self, document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let present = |text: &Option<String>| text.as_deref().map(strip_markup).filter(|t| !t.trim().is_empty());
        let (Some(conclusion), Some(summary)) = (present(&document.conclusion), present(&document.secondary_summary))
        else {
            return Ok(GateOutcome::new(GateName::BilingualAlignment, Vec::new()).with_stat("compared", 0));
        };

        let mismatch = |description: String| {
            Violation::new(GateName::BilingualAlignment, ViolationKind::BilingualMismatch, description)
                .at("secondary_summary")
        };
        let mut violations = Vec::new();

        let (primary_tone, secondary_tone) = (self.sentiment(&conclusion), self.sentiment(&summary));
        if primary_tone.opposes(secondary_tone) {
            violations.push(mismatch(format!(
                "conclusion reads {} but the secondary summary reads {}",
                primary_tone, secondary_tone
            )));
        }

        let primary_entities = self.entities(&conclusion, &document.entities);
        let secondary_entities = self.entities(&summary, &document.entities);
        if primary_entities.is_disjoint(&secondary_entities) {
            let list = |set: &BTreeSet<String>| {
                if set.is_empty() {
                    "none".to_string()
                } else {
                    set.iter().cloned().collect::<Vec<_>>().join(", ")
                }
            };
            violations.push(mismatch(format!(
                "conclusion and secondary summary share no entity (conclusion: {}; summary: {})",
                list(&primary_entities),
                list(&secondary_entities)
            )));
        }

        Ok(GateOutcome::new(GateName::BilingualAlignment, violations).with_stat("compared", 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_domain::Severity;
    use factgate_store::FactStore;
    use serde_json::json;

    fn facts() -> FactStore {
        FactStore::from_json_str(r#"{"NVDA": {"price": 188.12}}"#).unwrap()
    }

    fn article(markup: &str) -> Document {
        Document {
            markup: markup.to_string(),
            ..Default::default()
        }
    }

    fn preview() -> String {
        "輝達公布財報，資料中心營收續創新高。".repeat(12)
    }

    #[test]
    fn test_paywall_ok() {
        let doc = article(&format!("<p>{}</p><!--members-only--><p>完整分析</p>", preview()));
        let outcome = PaywallGate::new(&StructuralConfig::default()).check(&doc, &facts()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
        assert_eq!(outcome.stats["markers"], 1);
    }

    #[test]
    fn test_paywall_accepts_spaced_spelling() {
        let doc = article(&format!("<p>{}</p><!-- members-only --><p>完整分析</p>", preview()));
        let outcome = PaywallGate::new(&StructuralConfig::default()).check(&doc, &facts()).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn test_paywall_missing_is_high() {
        let doc = article(&format!("<p>{}</p>", preview()));
        let outcome = PaywallGate::new(&StructuralConfig::default()).check(&doc, &facts()).unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind(), ViolationKind::Structural);
        assert_eq!(outcome.violations[0].severity(), Severity::High);
        assert!(outcome.violations[0].description().contains("missing"));
    }

    #[test]
    fn test_paywall_twice_short_and_empty() {
        let gate = PaywallGate::new(&StructuralConfig::default());
        let doc = article("<p>a</p><!--members-only--><p>b</p><!--members-only-->");
        let outcome = gate.check(&doc, &facts()).unwrap();
        assert!(outcome.violations[0].description().contains("2 times"));

        let doc = article("<p>太短</p><!--members-only--><p> </p>");
        let descriptions: Vec<_> = gate
            .check(&doc, &facts())
            .unwrap()
            .violations
            .iter()
            .map(|v| v.description().to_string())
            .collect();
        assert_eq!(descriptions.len(), 2);
        assert!(descriptions[0].contains("2 characters"));
        assert!(descriptions[1].contains("empty"));
    }

    #[test]
    fn test_required_sections_and_bounds() {
        let gate = SectionsGate::new(&StructuralConfig::default());
        let mut doc = article(r#"<section data-section="what_to_watch"></section>"#);
        doc.doc_type = "flash".to_string();
        doc.fields.insert("tldr".to_string(), json!(["a", "b"]));

        let outcome = gate.check(&doc, &facts()).unwrap();
        let descriptions: Vec<_> = outcome.violations.iter().map(|v| v.description().to_string()).collect();
        assert_eq!(
            descriptions,
            vec![
                "section 'tldr' has 2 items, at least 3 required".to_string(),
                "required section 'key_stocks' is missing".to_string(),
            ]
        );
        assert_eq!(outcome.violations[1].location(), "fields.key_stocks");
        assert_eq!(outcome.stats["required"], 3);
    }

    #[test]
    fn test_sections_too_many_items() {
        let gate = SectionsGate::new(&StructuralConfig::default());
        let mut doc = article("");
        doc.fields.insert("tldr".to_string(), json!(["1", "2", "3", "4", "5", "6", "7", "8", "9"]));
        let outcome = gate.check(&doc, &facts()).unwrap();
        assert!(outcome.violations[0].description().contains("at most 8"));
    }

    fn sourced(sources: serde_json::Value) -> Document {
        serde_json::from_value(json!({"sources": sources})).unwrap()
    }

    #[test]
    fn test_sources_sufficient() {
        let doc = sourced(json!([
            "NVIDIA beats estimates - Reuters: https://example.com/a",
            {"title": "Chip stocks slide - Bloomberg"},
            {"title": "Data center outlook", "publisher": "CNBC"}
        ]));
        let outcome = SourcesGate::new(&StructuralConfig::default()).check(&doc, &facts()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
        assert_eq!(outcome.stats["sources"], 3);
        assert_eq!(outcome.stats["publishers"], 3);
    }

    #[test]
    fn test_too_few_sources_is_high() {
        let doc = sourced(json!(["Only one - Reuters"]));
        let outcome = SourcesGate::new(&StructuralConfig::default()).check(&doc, &facts()).unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].severity(), Severity::High);
        assert_eq!(outcome.violations[0].description(), "1 sources cited, at least 3 required");
        assert_eq!(outcome.violations[0].location(), "sources");
    }

    #[test]
    fn test_distinct_publishers_ignore_case() {
        let mut config = StructuralConfig::default();
        config.sources.min_distinct_publishers = 2;
        let doc = sourced(json!(["a - Reuters", "b - reuters", {"title": "c", "publisher": "REUTERS"}]));
        let outcome = SourcesGate::new(&config).check(&doc, &facts()).unwrap();
        assert_eq!(outcome.stats["publishers"], 1);
        assert!(outcome.violations[0].description().contains("1 distinct publishers"));
    }

    #[test]
    fn test_rumor_as_primary_event() {
        let mut doc = sourced(json!(["a - Reuters", "b - Bloomberg", "c - CNBC"]));
        doc.primary_event = Some(factgate_domain::PrimaryEvent {
            event_type: "rumor".to_string(),
            ..Default::default()
        });

        let outcome = SourcesGate::new(&StructuralConfig::default()).check(&doc, &facts()).unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind(), ViolationKind::Structural);
        assert_eq!(outcome.violations[0].location(), "primary_event.event_type");

        let mut config = StructuralConfig::default();
        config.sources.allow_rumor_as_primary = true;
        assert!(SourcesGate::new(&config).check(&doc, &facts()).unwrap().passed);
    }

    #[test]
    fn test_title_candidates_bound() {
        let mut config = StructuralConfig::default();
        config.sections.insert(
            "flash".to_string(),
            vec![SectionRule { id: "title_candidates".to_string(), min_items: Some(5), max_items: None }],
        );
        let gate = SectionsGate::new(&config);
        let mut doc = article("");
        doc.doc_type = "flash".to_string();
        doc.fields.insert("title_candidates".to_string(), json!(["a", "b", "c", "d"]));
        let outcome = gate.check(&doc, &facts()).unwrap();
        assert_eq!(
            outcome.violations[0].description(),
            "section 'title_candidates' has 4 items, at least 5 required"
        );

        doc.fields.insert("title_candidates".to_string(), json!(["a", "b", "c", "d", "e"]));
        assert!(gate.check(&doc, &facts()).unwrap().passed);
    }

    #[test]
    fn test_sentiment() {
        let gate = BilingualGate::new(&StructuralConfig::default(), &[]);
        assert_eq!(gate.sentiment("NVDA 股價上漲"), Sentiment::Positive);
        assert_eq!(gate.sentiment("Outlook is bearish"), Sentiment::Negative);
        assert_eq!(gate.sentiment("上漲後下跌"), Sentiment::Mixed);
        assert_eq!(gate.sentiment("維持觀望"), Sentiment::Neutral);
    }

    #[test]
    fn test_bilingual_opposite_tone() {
        let gate = BilingualGate::new(&StructuralConfig::default(), &[]);
        let mut doc = article("");
        doc.conclusion = Some("NVDA 前景樂觀，看多".to_string());
        doc.secondary_summary = Some("NVDA outlook is bearish".to_string());
        let outcome = gate.check(&doc, &facts()).unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].severity(), Severity::Medium);
        assert!(outcome.violations[0].description().contains("positive"));
    }

    #[test]
    fn test_bilingual_needs_shared_entity() {
        let gate = BilingualGate::new(&StructuralConfig::default(), &[]);
        let mut doc = article("");
        doc.entities = vec!["NVDA".to_string(), "AMD".to_string()];
        doc.conclusion = Some("NVDA 走勢強勁".to_string());
        doc.secondary_summary = Some("AMD looks strong".to_string());
        let outcome = gate.check(&doc, &facts()).unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert!(outcome.violations[0].description().contains("conclusion: NVDA; summary: AMD"));
    }

    #[test]
    fn test_bilingual_skipped_without_summary() {
        let gate = BilingualGate::new(&StructuralConfig::default(), &[]);
        let mut doc = article("");
        doc.conclusion = Some("NVDA 看多".to_string());
        let outcome = gate.check(&doc, &facts()).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.stats["compared"], 0);
    }
}
