//! Compliance language: promissory phrases, the investment disclaimer and
//! leftover generation placeholders

use crate::config::ComplianceConfig;
use crate::gate::Gate;
use crate::text::{excerpt, find_term, sentence_bounds};
use crate::GatekeeperError;
use factgate_domain::{Document, FactLookup, GateName, GateOutcome, Violation, ViolationKind};
use factgate_extractor::strip_markup;
use regex::{Regex, RegexBuilder};

const EXCERPT_CHARS: usize = 80;

/// Checks reader-visible language
pub struct ComplianceGate {
    forbidden: Vec<String>,
    disclosures: Vec<String>,
    placeholders: Option<Regex>,
}

impl ComplianceGate {
    /// Compile the placeholder patterns
    pub fn new(config: &ComplianceConfig) -> Result<Self, GatekeeperError> {
        let patterns: Vec<&str> = config
            .placeholder_patterns
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .collect();
        let placeholders = if patterns.is_empty() {
            None
        } else {
            let alternation = patterns.iter().map(|p| format!("(?:{})", p)).collect::<Vec<_>>().join("|");
            Some(RegexBuilder::new(&alternation).case_insensitive(true).build()?)
        };

        Ok(Self {
            forbidden: config.forbidden_phrases.clone(),
            disclosures: config.disclosure_keywords.clone(),
            placeholders,
        })
    }
}

impl Gate for ComplianceGate {
    fn name(&self) -> GateName {
        GateName::Compliance
    }

    fn check(&self, document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let mut violations = Vec::new();
        let mut disclosed = false;
        let mut forbidden_hits = 0u64;
        let mut placeholder_hits = 0u64;

        for segment in document.text_segments() {
            let text = strip_markup(segment.text);

            for phrase in &self.forbidden {
                for offset in find_term(&text, phrase) {
                    forbidden_hits += 1;
                    violations.push(
                        Violation::new(
                            GateName::Compliance,
                            ViolationKind::ForbiddenLanguage,
                            format!("promissory phrase '{}'", phrase),
                        )
                        .with_excerpt(excerpt(&text, sentence_bounds(&text, offset), EXCERPT_CHARS))
                        .at(segment.location.clone()),
                    );
                }
            }

            if let Some(placeholders) = &self.placeholders {
                for m in placeholders.find_iter(&text) {
                    placeholder_hits += 1;
                    violations.push(
                        Violation::new(
                            GateName::Compliance,
                            ViolationKind::Placeholder,
                            format!("unresolved placeholder '{}'", m.as_str()),
                        )
                        .with_excerpt(excerpt(&text, sentence_bounds(&text, m.start()), EXCERPT_CHARS))
                        .at(segment.location.clone()),
                    );
                }
            }

            disclosed |= self.disclosures.iter().any(|k| !find_term(&text, k).is_empty());
        }

        if !disclosed {
            violations.push(Violation::new(
                GateName::Compliance,
                ViolationKind::MissingDisclosure,
                "no investment disclaimer found",
            ));
        }

        Ok(GateOutcome::new(GateName::Compliance, violations)
            .with_stat("forbidden", forbidden_hits)
            .with_stat("placeholders", placeholder_hits)
            .with_stat("disclosed", u64::from(disclosed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_domain::Severity;
    use factgate_store::FactStore;

    fn gate() -> ComplianceGate {
        ComplianceGate::new(&ComplianceConfig::default()).unwrap()
    }

    fn facts() -> FactStore {
        FactStore::from_json_str(r#"{"NVDA": {"price": 188.12}}"#).unwrap()
    }

    fn check(markup: &str) -> GateOutcome {
        let document = Document {
            markup: markup.to_string(),
            ..Default::default()
        };
        gate().check(&document, &facts()).unwrap()
    }

    #[test]
    fn test_clean_article_passes() {
        let outcome = check("<p>NVDA 收盤 188.12。</p><p>本文僅供參考，非投資建議。</p>");
        assert!(outcome.passed, "{:?}", outcome.violations);
        assert_eq!(outcome.stats["disclosed"], 1);
    }

    #[test]
    fn test_promissory_phrase_is_critical() {
        let outcome = check("<p>這是穩賺不賠的機會。非投資建議。</p>");
        assert_eq!(outcome.violations.len(), 1);
        let violation = &outcome.violations[0];
        assert_eq!(violation.kind(), ViolationKind::ForbiddenLanguage);
        assert_eq!(violation.severity(), Severity::Critical);
        assert_eq!(violation.excerpt(), "這是穩賺不賠的機會");
    }

    #[test]
    fn test_english_phrases_are_case_insensitive() {
        let outcome = check("A Risk-Free trade. This is not investment advice.");
        assert_eq!(outcome.stats["forbidden"], 1);
        assert!(!check("risk-freedom. Not investment advice.").violations.iter().any(|v| v.kind() == ViolationKind::ForbiddenLanguage));
    }

    #[test]
    fn test_missing_disclosure_is_high() {
        let outcome = check("<p>NVDA 收盤 188.12。</p>");
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind(), ViolationKind::MissingDisclosure);
        assert_eq!(outcome.violations[0].severity(), Severity::High);
    }

    #[test]
    fn test_placeholders() {
        let outcome = check("<p>營收 QoQ +數據%，毛利 ⟦UNTRACED⟧，EPS [tbd]。非投資建議</p>");
        let found: Vec<_> = outcome
            .violations
            .iter()
            .filter(|v| v.kind() == ViolationKind::Placeholder)
            .map(|v| v.description().to_string())
            .collect();
        assert_eq!(
            found,
            vec![
                "unresolved placeholder '+數據%'".to_string(),
                "unresolved placeholder '⟦UNTRACED⟧'".to_string(),
                "unresolved placeholder '[tbd]'".to_string(),
            ]
        );
    }

    #[test]
    fn test_bad_placeholder_pattern() {
        let config = ComplianceConfig {
            placeholder_patterns: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(ComplianceGate::new(&config), Err(GatekeeperError::Pattern(_))));
    }
}
